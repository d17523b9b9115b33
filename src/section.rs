use serde::{Deserialize, Serialize};

/// The four assessment sections. Declaration order is the canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "Adaptability & Learning")]
    AdaptabilityLearning,
    #[serde(rename = "Aptitude Test")]
    Aptitude,
    #[serde(rename = "Communication Skills - Descriptive")]
    CommunicationDescriptive,
    #[serde(rename = "Communication Skills - Objective")]
    CommunicationObjective,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::AdaptabilityLearning,
        Section::Aptitude,
        Section::CommunicationDescriptive,
        Section::CommunicationObjective,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::AdaptabilityLearning => "Adaptability & Learning",
            Section::Aptitude => "Aptitude Test",
            Section::CommunicationDescriptive => "Communication Skills - Descriptive",
            Section::CommunicationObjective => "Communication Skills - Objective",
        }
    }

    pub fn from_name(raw: &str) -> Option<Section> {
        let trimmed = raw.trim();
        Section::ALL.into_iter().find(|s| s.name() == trimmed)
    }

    pub fn default_bank_file(self) -> &'static str {
        match self {
            Section::AdaptabilityLearning => "adaptability_learning.csv",
            Section::Aptitude => "aptitude.csv",
            Section::CommunicationDescriptive => "communication_skills_descriptive.csv",
            Section::CommunicationObjective => "communication_skills_objective.csv",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
