//! Tools the harness knows how to drive, keyed by their server-side names.

use std::fmt;
use std::str::FromStr;

/// A tool with a dedicated session-client call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTool {
    GetCurrentDate,
    Authenticate,
    CloseSession,
    ExploreSchema,
    SearchSchema,
    DescribeType,
    ExecuteGraphql,
}

impl KnownTool {
    /// Every known tool.
    pub const ALL: [KnownTool; 7] = [
        KnownTool::GetCurrentDate,
        KnownTool::Authenticate,
        KnownTool::CloseSession,
        KnownTool::ExploreSchema,
        KnownTool::SearchSchema,
        KnownTool::DescribeType,
        KnownTool::ExecuteGraphql,
    ];

    /// Server-side tool name.
    pub fn name(&self) -> &'static str {
        match self {
            KnownTool::GetCurrentDate => "get_current_date",
            KnownTool::Authenticate => "authenticate",
            KnownTool::CloseSession => "close_session",
            KnownTool::ExploreSchema => "explore_schema",
            KnownTool::SearchSchema => "search_schema",
            KnownTool::DescribeType => "describe_type",
            KnownTool::ExecuteGraphql => "execute_graphql",
        }
    }

    /// Resolve a server-side name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tool| tool.name() == name)
    }

    /// Whether a successful call may change which tools the server offers.
    pub fn changes_auth(&self) -> bool {
        matches!(self, KnownTool::Authenticate | KnownTool::CloseSession)
    }
}

impl fmt::Display for KnownTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Schema sections accepted by `explore_schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaCategory {
    Queries,
    Mutations,
    Types,
    Inputs,
    Enums,
    Interfaces,
}

impl SchemaCategory {
    pub const ALL: [SchemaCategory; 6] = [
        SchemaCategory::Queries,
        SchemaCategory::Mutations,
        SchemaCategory::Types,
        SchemaCategory::Inputs,
        SchemaCategory::Enums,
        SchemaCategory::Interfaces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaCategory::Queries => "queries",
            SchemaCategory::Mutations => "mutations",
            SchemaCategory::Types => "types",
            SchemaCategory::Inputs => "inputs",
            SchemaCategory::Enums => "enums",
            SchemaCategory::Interfaces => "interfaces",
        }
    }
}

impl fmt::Display for SchemaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SchemaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unsupported category '{}' (expected one of: {})",
                    s,
                    Self::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}
