//! OpenSearch index configuration and mappings.
//!
//! This module defines the settings and mappings used when the loader has to
//! create the inspection index itself.

use serde_json::{json, Value};

/// Get the index settings and mappings for the inspection index.
///
/// The mapping covers exactly the ten cleaned columns:
/// - **Numeric fields**: `business_id`, `business_postal_code`, `inspection_score`
/// - **Full-text fields**: name, address and violation description, with a
///   `raw` keyword sub-field on the name for exact matches and aggregations
/// - **Keyword fields**: inspection date (kept as text), type, risk category
///   and supervisor district, for filtering
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "business_id": {
                    "type": "long"
                },
                "business_name": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "business_address": {
                    "type": "text"
                },
                "business_postal_code": {
                    "type": "long"
                },
                "inspection_date": {
                    "type": "keyword"
                },
                "inspection_score": {
                    "type": "double"
                },
                "inspection_type": {
                    "type": "keyword"
                },
                "violation_description": {
                    "type": "text"
                },
                "risk_category": {
                    "type": "keyword"
                },
                "current_supervisor_districts": {
                    "type": "keyword"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspection_indexer_shared::{ColumnType, CLEANED_COLUMNS};

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["settings"]["number_of_replicas"].is_number());
        assert_eq!(
            settings["mappings"]["properties"]["business_name"]["fields"]["raw"]["type"],
            "keyword"
        );
    }

    #[test]
    fn test_mapping_covers_cleaned_columns() {
        let settings = get_index_settings();
        let properties = settings["mappings"]["properties"].as_object().unwrap();

        assert_eq!(properties.len(), CLEANED_COLUMNS.len());

        for (name, column_type) in CLEANED_COLUMNS {
            let mapped = properties[name]["type"].as_str().unwrap();
            match column_type {
                ColumnType::Integer => assert_eq!(mapped, "long", "column {}", name),
                ColumnType::Float => assert_eq!(mapped, "double", "column {}", name),
                ColumnType::Text => assert!(
                    mapped == "text" || mapped == "keyword",
                    "column {}",
                    name
                ),
            }
        }
    }
}
