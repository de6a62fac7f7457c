use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const FULL_NAME: &str = "full_name";
pub const ID: &str = "id";
pub const YEARS_IN_COMPANY: &str = "years_in_company";
pub const SENIORITY: &str = "seniority";

pub const COLUMNS: [&str; 8] = [
    FULL_NAME,
    ID,
    "project_manager_name",
    "project_name",
    "technical_skill",
    "soft_skills",
    YEARS_IN_COMPANY,
    SENIORITY,
];

/// Rows of loosely typed values under named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Table {
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Pair each column name with the row's value.
    pub fn row_map(&self, row: &[Value]) -> Map<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }
}

/// The fixed employee table analysed by the handler.
pub fn sample_table() -> Table {
    let rows: Vec<Vec<Value>> = vec![
        row("John Doe", "1", "Alice", "Project A", json!({"Python": 3, "AWS": 2}), json!({"Communication": 5, "Teamwork": 4}), 3, "SE1"),
        row("Jane Smith", "2", "Bob", "Project B", json!({"Java": 4, "AWS": 3}), json!({"Leadership": 5, "Problem-solving": 5}), 5, "SE2"),
        row("Mark Johnson", "3", "Charlie", "Project A", json!({"Go": 4, "AWS": 4}), json!({"Adaptability": 4, "Collaboration": 3}), 2, "SE1"),
        row("Eve Brown", "4", "Alice", "Project C", json!({"Ruby": 5, "SQL": 3}), json!({"Time management": 5, "Creativity": 4}), 6, "SSE"),
        row("Chris Green", "5", "Bob", "Project B", json!({"JavaScript": 4, "AWS": 2}), json!({"Problem-solving": 5, "Teamwork": 3}), 3, "SE2"),
        row("Olivia Taylor", "6", "David", "Project A", json!({"Python": 4, "Django": 3}), json!({"Communication": 4, "Leadership": 3}), 4, "SSE"),
        row("Daniel White", "7", "Eve", "Project D", json!({"C++": 3, "Java": 4}), json!({"Adaptability": 4, "Collaboration": 5}), 2, "SE1"),
        row("Sophia Martin", "8", "Frank", "Project E", json!({"Swift": 4, "AWS": 4}), json!({"Time management": 3, "Leadership": 4}), 5, "SSE"),
        row("Liam Wilson", "9", "Grace", "Project F", json!({"Go": 4, "Kubernetes": 2}), json!({"Problem-solving": 5, "Teamwork": 4}), 7, "SSE"),
        row("Mia Moore", "10", "Harry", "Project G", json!({"Java": 3, "React": 4}), json!({"Creativity": 5, "Communication": 4}), 1, "SE1"),
    ];

    Table::new(&COLUMNS, rows)
}

#[allow(clippy::too_many_arguments)]
fn row(
    full_name: &str,
    id: &str,
    manager: &str,
    project: &str,
    technical_skill: Value,
    soft_skills: Value,
    years: u32,
    seniority: &str,
) -> Vec<Value> {
    vec![
        json!(full_name),
        json!(id),
        json!(manager),
        json!(project),
        technical_skill,
        soft_skills,
        json!(years),
        json!(seniority),
    ]
}
