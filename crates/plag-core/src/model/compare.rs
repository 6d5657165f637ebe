use serde::{Deserialize, Serialize};

/// Cheap similarity signals used upstream to prioritize candidate pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FastCompareInfo {
    pub jakkar: f64,
    pub operators: f64,
    pub keywords: f64,
    pub literals: f64,
    pub weighted_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuresInfo {
    /// Conventionally in `[0, 1]`.
    pub similarity: f64,
    /// Rows follow the structural units of the first record, columns those of
    /// the second; each cell holds a `[matched, total]` pair.
    pub compliance_matrix: Vec<Vec<[i64; 2]>>,
}

/// Outcome of comparing two feature records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareInfo {
    pub fast: FastCompareInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructuresInfo>,
}

impl CompareInfo {
    pub fn new(fast: FastCompareInfo) -> Self {
        Self {
            fast,
            structure: None,
        }
    }

    pub fn with_structure(mut self, structure: StructuresInfo) -> Self {
        self.structure = Some(structure);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_omitted_when_absent() {
        let info = CompareInfo::new(FastCompareInfo {
            jakkar: 0.5,
            operators: 0.25,
            keywords: 1.0,
            literals: 0.0,
            weighted_average: 0.44,
        });
        let value = serde_json::to_value(&info).unwrap();
        assert!(value.get("structure").is_none());
        assert_eq!(value["fast"]["jakkar"], 0.5);
    }
}
