//! Trending-papers tool backed by the Hugging Face daily papers API.

use chat_protocol::{Function, Tool};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

pub const DAILY_PAPERS_API: &str = "https://huggingface.co/api/daily_papers";

#[derive(Debug, Deserialize)]
struct DailyPaperEntry {
    #[serde(default)]
    paper: PaperDetails,
    #[serde(default)]
    thumbnail: String,
}

#[derive(Debug, Default, Deserialize)]
struct PaperDetails {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    upvotes: i64,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(default, rename = "publishedAt")]
    published_at: String,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: String,
}

/// Fetch the `n` most upvoted papers for a date (today when `None`),
/// as a pretty-printed JSON array string. Failures degrade to `"[]"`.
pub async fn top_papers(client: &reqwest::Client, n: usize, date: Option<String>) -> String {
    let date = date.unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());
    match fetch_ranked(client, &date).await {
        Ok(mut papers) => {
            papers.truncate(n);
            serde_json::to_string_pretty(&papers).unwrap_or_else(|_| "[]".to_string())
        }
        Err(err) => {
            warn!(date = %date, error = %err, "Failed to fetch daily papers");
            "[]".to_string()
        }
    }
}

async fn fetch_ranked(
    client: &reqwest::Client,
    date: &str,
) -> Result<Vec<serde_json::Value>, reqwest::Error> {
    let entries: Vec<DailyPaperEntry> = client
        .get(DAILY_PAPERS_API)
        .query(&[("date", date), ("limit", "50")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(rank_papers(entries))
}

fn rank_papers(entries: Vec<DailyPaperEntry>) -> Vec<serde_json::Value> {
    let mut papers: Vec<_> = entries
        .into_iter()
        .map(|entry| {
            let authors: Vec<_> = entry.paper.authors.into_iter().map(|a| a.name).collect();
            json!({
                "title": entry.paper.title,
                "link": format!("https://huggingface.co/papers/{}", entry.paper.id),
                "upvotes": entry.paper.upvotes,
                "thumbnail": entry.thumbnail,
                "authors": authors,
                "published_date": entry.paper.published_at,
                "summary": entry.paper.summary,
            })
        })
        .collect();

    papers.sort_by_key(|paper| std::cmp::Reverse(paper["upvotes"].as_i64().unwrap_or(0)));
    papers
}

/// Definition advertised in the tool catalog.
pub fn top_papers_tool() -> Tool {
    Tool {
        tool_type: "function".to_string(),
        function: Function {
            name: "get_top_papers".to_string(),
            description: Some(
                "Get the top N papers from the Hugging Face papers page based on the number of votes."
                    .to_string(),
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "n": {
                        "type": "integer",
                        "description": "Number of top papers to fetch."
                    },
                    "date": {
                        "type": "string",
                        "description": "Date of the papers to fetch. Default is the current date. Format: 'YYYY-MM-DD'."
                    }
                },
                "required": ["n"]
            }),
            strict: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_deserialize_with_missing_fields() {
        let entry: DailyPaperEntry = serde_json::from_value(json!({
            "paper": {"id": "2501.00001", "title": "A Paper", "upvotes": 12}
        }))
        .unwrap();
        assert_eq!(entry.paper.title, "A Paper");
        assert_eq!(entry.paper.upvotes, 12);
        assert!(entry.paper.authors.is_empty());
        assert!(entry.thumbnail.is_empty());
    }

    fn entry(title: &str, upvotes: i64) -> DailyPaperEntry {
        serde_json::from_value(json!({
            "paper": {"id": "x", "title": title, "upvotes": upvotes}
        }))
        .unwrap()
    }

    #[test]
    fn ranking_sorts_by_upvotes_descending() {
        let ranked = rank_papers(vec![entry("low", 2), entry("high", 40), entry("mid", 7)]);
        let titles: Vec<_> = ranked.iter().map(|p| p["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["high", "mid", "low"]);
    }

    #[test]
    fn paper_links_point_at_the_papers_page() {
        let ranked = rank_papers(vec![entry("only", 1)]);
        assert_eq!(
            ranked[0]["link"],
            json!("https://huggingface.co/papers/x")
        );
    }
}
