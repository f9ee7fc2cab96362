use anyhow::Ok;
use clap::{Args, Parser, Subcommand};
use gcd::{ClientConfigBuilder, Format, GcdClient, IssueQuery, ReqwestTransport, SeriesQuery};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "gcd-lookup",
    version,
    about = "Look up issues and series in the Grand Comics Database"
)]
struct Arguments {
    #[arg(long, help = "api root, defaults to the public GCD api")]
    prefix: Option<String>,
    #[arg(long, help = "value of the gcdsessionid cookie")]
    session_id: Option<String>,
    #[arg(long, default_value_t = 30, help = "request timeout in seconds")]
    timeout: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch one issue
    Issue {
        #[arg(help = "issue id or url")]
        issue: String,
    },
    /// Fetch one series, or search series by name
    Series(SeriesArgs),
}

#[derive(Debug, Args)]
struct SeriesArgs {
    #[arg(help = "series id or url", conflicts_with = "name")]
    series: Option<String>,
    #[arg(short, long)]
    name: Option<String>,
    #[arg(short, long, help = "position of the issue within the series")]
    issue_no: Option<i64>,
    #[arg(short, long)]
    year: Option<i64>,
    #[arg(short, long)]
    page: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Arguments::parse();

    let mut config = ClientConfigBuilder::default();
    if let Some(prefix) = args.prefix {
        config.prefix(prefix);
    }
    if let Some(session_id) = args.session_id {
        config.session_id(session_id);
    }
    let transport = ReqwestTransport::with_timeout(Duration::from_secs(args.timeout))?;
    let client = GcdClient::new(config.build()?, transport);

    let output = match args.command {
        Command::Issue { issue } => {
            let query = if issue.contains("comics.org") {
                IssueQuery::from_url(&issue)?
            } else {
                IssueQuery::new(issue.parse()?)
            };
            serde_json::to_string_pretty(&client.issue(&query.format(Format::Json)).await?)?
        }
        Command::Series(series) => {
            let mut query = match series.series {
                Some(s) if s.contains("comics.org") => SeriesQuery::from_url(&s)?,
                Some(s) => SeriesQuery::new().id(s.parse()?),
                None => SeriesQuery::new(),
            };
            let listing = series.name.is_some()
                || series.issue_no.is_some()
                || series.year.is_some()
                || series.page.is_some();
            match query.series_id() {
                // a bare id answers with a single series, not a page
                Some(id) if !listing => {
                    serde_json::to_string_pretty(&client.series_instance(id).await?)?
                }
                _ => {
                    if let Some(name) = series.name {
                        query = query.name(name);
                    }
                    if let Some(issue_no) = series.issue_no {
                        query = query.issue_no(issue_no);
                    }
                    if let Some(year) = series.year {
                        query = query.year(year);
                    }
                    if let Some(page) = series.page {
                        query = query.page(page);
                    }
                    serde_json::to_string_pretty(
                        &client.series(&query.format(Format::Json)).await?,
                    )?
                }
            }
        }
    };
    println!("{output}");
    Ok(())
}
