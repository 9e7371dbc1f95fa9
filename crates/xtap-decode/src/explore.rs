use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

const ADD_ENTRIES: &str = "TimelineAddEntries";
const MODULE_ENTRY: &str = "TimelineTimelineModule";
const EVENT_SUMMARY: &str = "TimelineEventSummary";
const TREND: &str = "TimelineTrend";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreContent {
    pub events: Vec<ExploreEvent>,
    pub trends: Vec<ExploreTrend>,
}

impl ExploreContent {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.trends.is_empty()
    }
}

/// Event summary card from the explore sidebar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreEvent {
    pub title: String,
    pub time: String,
    pub media_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreTrend {
    pub name: String,
    pub context: String,
    pub description: String,
}

#[derive(Deserialize)]
struct SidebarDocument {
    data: Option<SidebarData>,
}

#[derive(Deserialize)]
struct SidebarData {
    explore_sidebar: Option<Sidebar>,
}

#[derive(Deserialize)]
struct Sidebar {
    timeline: Option<SidebarTimeline>,
}

#[derive(Deserialize)]
struct SidebarTimeline {
    #[serde(default)]
    instructions: Vec<Value>,
}

#[derive(Deserialize)]
struct SidebarInstruction {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    entries: Vec<Value>,
}

#[derive(Deserialize)]
struct SidebarEntry {
    content: Option<ModuleContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleContent {
    entry_type: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Deserialize)]
struct ModuleItem {
    item: Option<ModuleItemInner>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleItemInner {
    item_content: Option<SidebarItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SidebarItem {
    item_type: Option<String>,
    title: Option<String>,
    time_string: Option<String>,
    image: Option<Image>,
    name: Option<String>,
    #[serde(rename = "trend_metadata")]
    trend_metadata: Option<TrendMetadata>,
}

#[derive(Deserialize)]
struct Image {
    url: Option<String>,
}

#[derive(Deserialize)]
struct TrendMetadata {
    domain_context: Option<String>,
    meta_description: Option<String>,
}

/// Decode an explore sidebar document into event and trend cards.
///
/// Missing card fields default to empty strings. Items that do not match the
/// card shapes are skipped.
pub fn decode_explore(doc: &Value) -> ExploreContent {
    let mut content = ExploreContent::default();

    let timeline = SidebarDocument::deserialize(doc)
        .ok()
        .and_then(|d| d.data)
        .and_then(|d| d.explore_sidebar)
        .and_then(|s| s.timeline);
    let Some(timeline) = timeline else {
        tracing::debug!("document has no explore sidebar container");
        return content;
    };

    for raw_instruction in &timeline.instructions {
        let Ok(instruction) = SidebarInstruction::deserialize(raw_instruction) else {
            continue;
        };
        if instruction.kind.as_deref() != Some(ADD_ENTRIES) {
            continue;
        }
        for raw_entry in &instruction.entries {
            let module = match SidebarEntry::deserialize(raw_entry) {
                Ok(SidebarEntry {
                    content: Some(module),
                }) if module.entry_type.as_deref() == Some(MODULE_ENTRY) => module,
                Ok(_) => continue,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed sidebar entry");
                    continue;
                }
            };
            for raw_item in &module.items {
                collect_item(raw_item, &mut content);
            }
        }
    }

    content
}

fn collect_item(raw: &Value, content: &mut ExploreContent) {
    let item = match ModuleItem::deserialize(raw) {
        Ok(item) => item.item.and_then(|i| i.item_content),
        Err(err) => {
            tracing::debug!(error = %err, "skipping malformed sidebar item");
            return;
        }
    };
    let Some(item) = item else {
        return;
    };

    match item.item_type.as_deref() {
        Some(EVENT_SUMMARY) => content.events.push(ExploreEvent {
            title: item.title.unwrap_or_default(),
            time: item.time_string.unwrap_or_default(),
            media_url: item.image.and_then(|i| i.url).unwrap_or_default(),
        }),
        Some(TREND) => {
            let (context, description) = match item.trend_metadata {
                Some(meta) => (
                    meta.domain_context.unwrap_or_default(),
                    meta.meta_description.unwrap_or_default(),
                ),
                None => Default::default(),
            };
            content.trends.push(ExploreTrend {
                name: item.name.unwrap_or_default(),
                context,
                description,
            });
        }
        _ => {}
    }
}

pub fn decode_explore_str(body: &str) -> Result<ExploreContent> {
    let doc: Value = serde_json::from_str(body)?;
    Ok(decode_explore(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sidebar(items: Vec<Value>) -> Value {
        json!({
            "data": {
                "explore_sidebar": {
                    "id": "abc",
                    "timeline": {
                        "instructions": [{
                            "type": "TimelineAddEntries",
                            "entries": [{
                                "entryId": "stories",
                                "content": {
                                    "entryType": "TimelineTimelineModule",
                                    "items": items
                                }
                            }]
                        }]
                    }
                }
            }
        })
    }

    #[test]
    fn test_missing_sidebar_is_empty() {
        assert!(decode_explore(&json!({})).is_empty());
        assert!(decode_explore(&json!({"data": {"home": {}}})).is_empty());
        assert!(decode_explore(&json!("text")).is_empty());
    }

    #[test]
    fn test_events_and_trends() {
        let doc = sidebar(vec![
            json!({"item": {"itemContent": {
                "itemType": "TimelineEventSummary",
                "title": "Launch day",
                "timeString": "LIVE",
                "image": {"url": "https://pbs.example/launch.jpg"}
            }}}),
            json!({"item": {"itemContent": {
                "itemType": "TimelineTrend",
                "name": "#rustlang",
                "trend_metadata": {
                    "domain_context": "Technology",
                    "meta_description": "12K posts"
                }
            }}}),
            json!({"item": {"itemContent": {"itemType": "TimelineTrend", "name": "bare"}}}),
        ]);

        let content = decode_explore(&doc);
        assert_eq!(
            content.events,
            vec![ExploreEvent {
                title: "Launch day".to_string(),
                time: "LIVE".to_string(),
                media_url: "https://pbs.example/launch.jpg".to_string(),
            }]
        );
        assert_eq!(content.trends.len(), 2);
        assert_eq!(content.trends[0].context, "Technology");
        assert_eq!(content.trends[0].description, "12K posts");
        assert_eq!(content.trends[1].name, "bare");
        assert_eq!(content.trends[1].context, "");
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let doc = sidebar(vec![
            json!(42),
            json!({"item": {"itemContent": {"itemType": "TimelineTrend", "name": 7}}}),
            json!({"item": {"itemContent": {"itemType": "TimelineTweet"}}}),
            json!({"item": {"itemContent": {"itemType": "TimelineTrend", "name": "ok"}}}),
        ]);
        let content = decode_explore(&doc);
        assert!(content.events.is_empty());
        assert_eq!(content.trends.len(), 1);
        assert_eq!(content.trends[0].name, "ok");
    }
}
