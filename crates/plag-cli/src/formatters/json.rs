use plag_core::model::ASTFeatures;
use serde_json::json;

pub fn format_json(works: &[ASTFeatures]) -> String {
    let works: Vec<serde_json::Value> = works
        .iter()
        .map(|w| {
            json!({
                "id": w.id,
                "sha256": w.sha256,
                "modifyDate": w.modify_date,
                "countOfNodes": w.features.count_of_nodes,
                "headNodes": w.features.head_nodes,
            })
        })
        .collect();

    let output = json!({
        "summary": {
            "total": works.len(),
        },
        "works": works,
    });

    serde_json::to_string_pretty(&output).unwrap_or_default()
}
