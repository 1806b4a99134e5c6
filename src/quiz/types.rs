//! Question records and the requested distribution.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Kind of question the model is asked to produce
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// Four options, one correct answer (`TN`)
    #[serde(rename = "TN")]
    SingleChoice,
    /// Short numeric answer (`TLN`)
    #[serde(rename = "TLN")]
    NumericAnswer,
    /// Four statements, each true or false (`DS`)
    #[serde(rename = "DS")]
    TrueFalseSet,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [
        QuestionKind::SingleChoice,
        QuestionKind::NumericAnswer,
        QuestionKind::TrueFalseSet,
    ];

    /// Wire code used in the schema
    pub fn code(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "TN",
            QuestionKind::NumericAnswer => "TLN",
            QuestionKind::TrueFalseSet => "DS",
        }
    }

    /// Vietnamese label used in prompts
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "Trắc nghiệm",
            QuestionKind::NumericAnswer => "Tự luận số",
            QuestionKind::TrueFalseSet => "Đúng/Sai",
        }
    }
}

/// Cognitive level of a question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Biet,
    Hieu,
    VanDung,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Biet, Difficulty::Hieu, Difficulty::VanDung];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Biet => "Biết",
            Difficulty::Hieu => "Hiểu",
            Difficulty::VanDung => "Vận dụng",
        }
    }
}

/// One statement of a true/false set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub id: String,
    pub content: String,
    pub is_correct: bool,
}

/// Variation table rows, LaTeX cells
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VariationTable {
    pub x_nodes: Vec<String>,
    pub y_prime_signs: Vec<String>,
    pub y_prime_vals: Vec<String>,
    /// At a vertical asymptote the cell reads `Left||Right`
    pub y_nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeStyle {
    #[default]
    #[serde(rename = "SOLID", alias = "solid")]
    Solid,
    #[serde(rename = "DASHED", alias = "dashed")]
    Dashed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeometryNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometryEdge {
    pub from: String,
    pub to: String,
    /// Unknown styles are drawn solid
    #[serde(default, deserialize_with = "lenient")]
    pub style: EdgeStyle,
}

/// Solid-geometry figure; hidden edges are dashed
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeometryGraph {
    pub nodes: Vec<GeometryNode>,
    pub edges: Vec<GeometryEdge>,
}

/// Plot traces and layout, passed to the plotting widget untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlotSpec {
    pub data: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
}

/// A question produced by the model
///
/// `id`, `type` and `questionText` are required. Every other field is
/// best effort: a value of the wrong shape is dropped rather than
/// rejecting the question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(deserialize_with = "required_text")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(deserialize_with = "required_text")]
    pub question_text: String,
    #[serde(default, deserialize_with = "text_list", skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "answer_text", skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, deserialize_with = "plain_text")]
    pub explanation: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<Statement>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub variation_table_data: Option<VariationTable>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub graph_function: Option<String>,
    #[serde(default, deserialize_with = "text_list", skip_serializing_if = "Vec::is_empty")]
    pub asymptotes: Vec<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub geometry_graph: Option<GeometryGraph>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub plotly_data: Option<PlotSpec>,
}

/// Render a scalar as text; arrays and objects have no text form
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Fall back to the default when the value has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        debug!("Dropping malformed question field: {}", e);
        T::default()
    }))
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?)
        .ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn plain_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Numeric answers come back as numbers as often as strings
fn answer_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// A list of scalars as text; anything that is not a scalar is dropped
fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().filter_map(scalar_text).collect()),
        _ => Ok(Vec::new()),
    }
}

/// Requested counts for one question kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LevelCounts {
    #[serde(rename = "BIET")]
    pub biet: u32,
    #[serde(rename = "HIEU")]
    pub hieu: u32,
    #[serde(rename = "VANDUNG")]
    pub van_dung: u32,
}

impl LevelCounts {
    pub fn new(biet: u32, hieu: u32, van_dung: u32) -> Self {
        Self {
            biet,
            hieu,
            van_dung,
        }
    }

    pub fn get(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Biet => self.biet,
            Difficulty::Hieu => self.hieu,
            Difficulty::VanDung => self.van_dung,
        }
    }

    /// Sum of the three levels, `None` on overflow
    pub fn total(&self) -> Option<u32> {
        self.biet.checked_add(self.hieu)?.checked_add(self.van_dung)
    }
}

/// Requested counts per (kind × difficulty) cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuizDistribution {
    #[serde(rename = "TN")]
    pub single_choice: LevelCounts,
    #[serde(rename = "TLN")]
    pub numeric_answer: LevelCounts,
    #[serde(rename = "DS")]
    pub true_false_set: LevelCounts,
}

impl QuizDistribution {
    pub fn for_kind(&self, kind: QuestionKind) -> &LevelCounts {
        match kind {
            QuestionKind::SingleChoice => &self.single_choice,
            QuestionKind::NumericAnswer => &self.numeric_answer,
            QuestionKind::TrueFalseSet => &self.true_false_set,
        }
    }

    /// Number of questions requested, `None` on overflow
    pub fn total(&self) -> Option<u32> {
        QuestionKind::ALL
            .iter()
            .try_fold(0u32, |sum, kind| sum.checked_add(self.for_kind(*kind).total()?))
    }
}

/// Everything needed to ask for one quiz
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    pub topic: String,
    pub distribution: QuizDistribution,
    #[serde(default)]
    pub additional_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_distribution_totals() {
        let distribution = QuizDistribution {
            single_choice: LevelCounts::new(2, 1, 1),
            numeric_answer: LevelCounts::new(0, 1, 0),
            true_false_set: LevelCounts::new(0, 0, 2),
        };

        assert_eq!(distribution.for_kind(QuestionKind::SingleChoice).total(), Some(4));
        assert_eq!(
            distribution
                .for_kind(QuestionKind::TrueFalseSet)
                .get(Difficulty::VanDung),
            2
        );
        assert_eq!(distribution.total(), Some(7));
    }

    #[test]
    fn test_totals_overflow() {
        assert_eq!(LevelCounts::new(u32::MAX, 1, 0).total(), None);

        let distribution = QuizDistribution {
            single_choice: LevelCounts::new(u32::MAX, 0, 0),
            numeric_answer: LevelCounts::new(0, 0, 1),
            true_false_set: LevelCounts::default(),
        };
        assert_eq!(distribution.total(), None);
    }

    #[test]
    fn test_distribution_wire_names() {
        let distribution: QuizDistribution =
            serde_json::from_value(json!({"TN": {"BIET": 3}, "DS": {"HIEU": 1, "VANDUNG": 1}}))
                .unwrap();
        assert_eq!(distribution.single_choice, LevelCounts::new(3, 0, 0));
        assert_eq!(distribution.numeric_answer, LevelCounts::default());
        assert_eq!(distribution.total(), Some(5));
    }

    #[test]
    fn test_single_choice_record() {
        let record: QuestionRecord = serde_json::from_value(json!({
            "id": "q1",
            "type": "TN",
            "difficulty": "BIET",
            "questionText": "Đạo hàm của $x^2$ là",
            "options": ["$2x$", "$x$", "$2$", "$x^2$"],
            "correctAnswer": "A",
            "explanation": "$(x^2)' = 2x$"
        }))
        .unwrap();

        assert_eq!(record.kind, QuestionKind::SingleChoice);
        assert_eq!(record.difficulty, Some(Difficulty::Biet));
        assert_eq!(record.options.len(), 4);
        assert_eq!(record.correct_answer.as_deref(), Some("A"));
    }

    #[test]
    fn test_numeric_answer_as_number() {
        let record: QuestionRecord = serde_json::from_value(json!({
            "id": "q2",
            "type": "TLN",
            "questionText": "Tính $\\int_0^1 2x\\,dx$",
            "correctAnswer": 1.5,
            "explanation": null,
            "options": null
        }))
        .unwrap();

        assert_eq!(record.correct_answer.as_deref(), Some("1.5"));
        assert!(record.explanation.is_empty());
        assert!(record.options.is_empty());
    }

    #[test]
    fn test_structured_extras() {
        let record: QuestionRecord = serde_json::from_value(json!({
            "id": "q3",
            "type": "DS",
            "difficulty": "VANDUNG",
            "questionText": "Cho hình chóp S.ABC",
            "explanation": "",
            "statements": [
                {"id": "a", "content": "SA vuông góc đáy", "isCorrect": true},
                {"id": "b", "content": "AB = AC", "isCorrect": false}
            ],
            "asymptotes": ["x=2", "y=1"],
            "variationTableData": {"xNodes": ["-\\infty", "2", "+\\infty"], "yNodes": ["1", "+\\infty||-\\infty", "1"]},
            "geometryGraph": {
                "nodes": [{"id": "S", "x": 0, "y": 0, "z": 3}, {"id": "A", "x": 0, "y": 0, "z": 0, "labelPosition": "left"}],
                "edges": [{"from": "S", "to": "A", "style": "DASHED"}]
            },
            "plotlyData": {"data": [{"x": [1, 2], "y": [3, 4]}], "layout": {"title": null}}
        }))
        .unwrap();

        assert_eq!(record.statements.len(), 2);
        assert!(record.statements[0].is_correct);
        assert_eq!(record.asymptotes, vec!["x=2", "y=1"]);
        let table = record.variation_table_data.unwrap();
        assert_eq!(table.x_nodes.len(), 3);
        assert!(table.y_prime_signs.is_empty());
        let graph = record.geometry_graph.unwrap();
        assert_eq!(graph.edges[0].style, EdgeStyle::Dashed);
        assert_eq!(graph.nodes[1].label_position.as_deref(), Some("left"));
        assert_eq!(record.plotly_data.unwrap().data.len(), 1);
    }

    #[test]
    fn test_missing_required_field() {
        let result: Result<QuestionRecord, _> =
            serde_json::from_value(json!({"id": "q1", "questionText": "no type"}));
        assert!(result.is_err());

        let result: Result<QuestionRecord, _> =
            serde_json::from_value(json!({"id": "q1", "type": "ESSAY", "questionText": "?"}));
        assert!(result.is_err());

        let result: Result<QuestionRecord, _> =
            serde_json::from_value(json!({"id": {"n": 1}, "type": "TN", "questionText": "?"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_extras_are_dropped() {
        let record: QuestionRecord = serde_json::from_value(json!({
            "id": 7,
            "type": "DS",
            "difficulty": "DE",
            "questionText": "Cho hàm số",
            "options": [1, "b", {"x": 1}],
            "explanation": 3,
            "statements": "a, b, c",
            "asymptotes": "x=1",
            "variationTableData": [1, 2],
            "geometryGraph": {"nodes": [], "edges": [{"from": "A", "to": "B", "style": "dotted"}]},
            "plotlyData": "n/a"
        }))
        .unwrap();

        assert_eq!(record.id, "7");
        assert_eq!(record.difficulty, None);
        assert_eq!(record.options, vec!["1", "b"]);
        assert_eq!(record.explanation, "3");
        assert!(record.statements.is_empty());
        assert!(record.asymptotes.is_empty());
        assert_eq!(record.variation_table_data, None);
        assert_eq!(record.geometry_graph.unwrap().edges[0].style, EdgeStyle::Solid);
        assert_eq!(record.plotly_data, None);
    }
}
