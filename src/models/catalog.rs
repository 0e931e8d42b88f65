use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Named skill/currency rewarded by catalog tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub slug: String,
}

/// Static challenge definition. Created and edited by administrators only;
/// end-user actions never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogTask {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub hint: Option<String>,
    pub difficulty: Difficulty,
}

/// One reward line-item of a catalog task. Guaranteed rewards carry only a
/// skill and a quantity; additional (bonus) rewards also carry free text
/// describing the condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReward {
    pub id: String,
    pub task_id: String,
    pub skill_id: String,
    pub skill_title: String,
    pub quantity: i64,
    pub is_additional: bool,
    pub description: Option<String>,
}
