use getset::Getters;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// A single issue, as returned by `/issue/<id>/`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters)]
#[getset(get = "pub")]
pub struct Issue {
    api_url: String,
    #[serde(default)]
    series_name: String,
    #[serde(default)]
    descriptor: String,
    #[serde(default)]
    publication_date: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    page_count: String,
    #[serde(default)]
    editing: String,
    #[serde(default)]
    indicia_publisher: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    isbn: String,
    #[serde(default)]
    barcode: String,
    #[serde(default)]
    rating: String,
    #[serde(default)]
    on_sale_date: String,
    #[serde(default)]
    indicia_frequency: String,
    #[serde(default)]
    notes: String,
    /// `None` when the field is missing, `Some(None)` when it is `null`.
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    variant_of: Option<Option<String>>,
    /// Url of the owning series.
    #[serde(default)]
    series: String,
    #[serde(default)]
    story_set: Vec<StorySet>,
    #[serde(default)]
    cover: String,
}

/// One segment of an issue's content: a story, a cover, a text page...
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Getters)]
#[serde(default)]
#[getset(get = "pub")]
pub struct StorySet {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    feature: String,
    sequence_number: i32,
    page_count: String,
    script: String,
    pencils: String,
    inks: String,
    colors: String,
    letters: String,
    editing: String,
    job_number: String,
    genre: String,
    characters: String,
    synopsis: String,
    notes: String,
}

/// A single series, as returned by `/series/<id>/`.
///
/// `issue_descriptors[i]` describes `active_issues[i]`; payloads where the
/// two lists differ in length are rejected.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters)]
#[serde(try_from = "SeriesPayload")]
#[getset(get = "pub")]
pub struct Series {
    api_url: String,
    name: String,
    country: String,
    language: String,
    active_issues: Vec<String>,
    issue_descriptors: Vec<String>,
    color: String,
    dimensions: String,
    paper_stock: String,
    binding: String,
    publishing_format: String,
    notes: String,
    year_began: Option<i32>,
    year_ended: Option<i32>,
    publisher: String,
}

/// One page of a series listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters)]
#[getset(get = "pub")]
pub struct SeriesPage {
    /// Number of matching series across all pages.
    count: usize,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    previous: Option<String>,
    results: Vec<Series>,
}

#[derive(Deserialize)]
struct SeriesPayload {
    api_url: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    active_issues: Vec<String>,
    #[serde(default)]
    issue_descriptors: Vec<String>,
    #[serde(default)]
    color: String,
    #[serde(default)]
    dimensions: String,
    #[serde(default)]
    paper_stock: String,
    #[serde(default)]
    binding: String,
    #[serde(default)]
    publishing_format: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    year_began: Option<i32>,
    #[serde(default)]
    year_ended: Option<i32>,
    #[serde(default)]
    publisher: String,
}

impl TryFrom<SeriesPayload> for Series {
    type Error = String;

    fn try_from(raw: SeriesPayload) -> Result<Self, Self::Error> {
        if raw.active_issues.len() != raw.issue_descriptors.len() {
            return Err(format!(
                "series {} has {} active issues but {} issue descriptors",
                raw.api_url,
                raw.active_issues.len(),
                raw.issue_descriptors.len()
            ));
        }
        Ok(Self {
            api_url: raw.api_url,
            name: raw.name,
            country: raw.country,
            language: raw.language,
            active_issues: raw.active_issues,
            issue_descriptors: raw.issue_descriptors,
            color: raw.color,
            dimensions: raw.dimensions,
            paper_stock: raw.paper_stock,
            binding: raw.binding,
            publishing_format: raw.publishing_format,
            notes: raw.notes,
            year_began: raw.year_began,
            year_ended: raw.year_ended,
            publisher: raw.publisher,
        })
    }
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

fn parse_page_count(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok()
}

impl Issue {
    pub fn page_count_value(&self) -> Option<f32> {
        parse_page_count(&self.page_count)
    }

    pub fn is_variant(&self) -> bool {
        matches!(&self.variant_of, Some(Some(_)))
    }

    /// Story entries ordered by sequence number, falling back to their
    /// position in the payload.
    pub fn stories(&self) -> Vec<&StorySet> {
        let mut stories: Vec<&StorySet> = self.story_set.iter().collect();
        stories.sort_by_key(|x| x.sequence_number);
        stories
    }
}

impl StorySet {
    pub fn page_count_value(&self) -> Option<f32> {
        parse_page_count(&self.page_count)
    }
}

impl Series {
    /// Pairs of issue url and issue descriptor.
    pub fn issues(&self) -> impl Iterator<Item = (&str, &str)> {
        self.active_issues
            .iter()
            .zip(self.issue_descriptors.iter())
            .map(|(url, descriptor)| (url.as_str(), descriptor.as_str()))
    }

    pub fn is_running(&self) -> bool {
        self.year_ended.is_none()
    }
}

impl SeriesPage {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}
