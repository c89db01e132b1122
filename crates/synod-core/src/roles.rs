//! Agent role catalog
//!
//! Roles are a closed, enumerable set with a compile-time profile table.
//! An unknown role id is a structural [`Error::RoleNotFound`], not a runtime
//! string miss. The catalog is fixed at process start; there is no dynamic
//! registration.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

const fn cutoff(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => d,
        None => panic!("invalid knowledge cutoff date"),
    }
}

/// Expert role in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// General-purpose fallback expert
    Generalist,
    /// Code quality, bugs, and improvements
    CodeAnalyzer,
    /// System design and structural trade-offs
    Architect,
    /// Vulnerabilities, hardening, secure defaults
    SecurityExpert,
    /// Information gathering and comparative analysis
    Researcher,
    /// Developer-facing writing
    Documentation,
    /// Test design and verification
    TestEngineer,
}

impl Role {
    /// Every role in the catalog
    pub const ALL: &'static [Role] = &[
        Role::Generalist,
        Role::CodeAnalyzer,
        Role::Architect,
        Role::SecurityExpert,
        Role::Researcher,
        Role::Documentation,
        Role::TestEngineer,
    ];

    /// Return the wire id
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generalist => "generalist",
            Self::CodeAnalyzer => "code-analyzer",
            Self::Architect => "architect",
            Self::SecurityExpert => "security-expert",
            Self::Researcher => "researcher",
            Self::Documentation => "documentation",
            Self::TestEngineer => "test-engineer",
        }
    }

    /// Look up a role by wire id
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Role::ALL.iter().copied().find(|r| r.as_str() == id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Generalist
    }
}

/// Static expertise profile backing a role
#[derive(Debug, Clone)]
pub struct RoleProfile {
    /// Wire id
    pub id: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// Domain of expertise
    pub domain: &'static str,
    /// What the role takes on
    pub scope: &'static str,
    /// What the role defers on
    pub limitations: &'static str,
    /// Base system prompt
    pub base_prompt: &'static str,
    /// Whether dispatch runs a freshness check for this role
    pub requires_freshness: bool,
    /// Date after which the role's static knowledge may be stale
    pub knowledge_cutoff: NaiveDate,
    /// Search phrase used by the freshness check
    pub freshness_query: &'static str,
}

static GENERALIST: RoleProfile = RoleProfile {
    id: "generalist",
    display_name: "Generalist",
    domain: "general software engineering",
    scope: "any task that does not clearly belong to a specialist",
    limitations: "defers to specialists for deep security or architectural review",
    base_prompt: "You are a pragmatic senior software engineer. Answer the task directly \
        and completely, flagging anything that deserves specialist attention.",
    requires_freshness: false,
    knowledge_cutoff: cutoff(2025, 4, 1),
    freshness_query: "software engineering notable developments",
};

static CODE_ANALYZER: RoleProfile = RoleProfile {
    id: "code-analyzer",
    display_name: "Code Analyzer",
    domain: "code quality and correctness",
    scope: "reviewing and improving code: bugs, edge cases, readability, performance",
    limitations: "does not make product or architectural decisions",
    base_prompt: "You are a code analysis expert. Focus on code quality, bugs, edge cases, \
        and concrete improvements. Cite the exact code location for every finding.",
    requires_freshness: false,
    knowledge_cutoff: cutoff(2025, 4, 1),
    freshness_query: "static analysis code review tooling updates",
};

static ARCHITECT: RoleProfile = RoleProfile {
    id: "architect",
    display_name: "Architect",
    domain: "system design",
    scope: "structure, boundaries, data flow, and trade-off analysis",
    limitations: "does not produce line-level code review",
    base_prompt: "You are a software architect. Reason about structure, boundaries, and \
        trade-offs. Prefer the simplest design that satisfies the stated constraints, and \
        say what you are trading away.",
    requires_freshness: false,
    knowledge_cutoff: cutoff(2025, 4, 1),
    freshness_query: "software architecture patterns developments",
};

static SECURITY_EXPERT: RoleProfile = RoleProfile {
    id: "security-expert",
    display_name: "Security Expert",
    domain: "application security",
    scope: "vulnerabilities, hardening, secure defaults, dependency risk",
    limitations: "advises on risk; does not sign off on compliance",
    base_prompt: "You are an application security expert. Identify vulnerabilities, risky \
        defaults, and dependency exposure. Rank findings by severity and give a concrete \
        remediation for each.",
    requires_freshness: true,
    knowledge_cutoff: cutoff(2025, 1, 15),
    freshness_query: "application security vulnerabilities CVE disclosures",
};

static RESEARCHER: RoleProfile = RoleProfile {
    id: "researcher",
    display_name: "Researcher",
    domain: "technical research",
    scope: "gathering, comparing, and summarizing external information",
    limitations: "reports findings; does not make the final call",
    base_prompt: "You are a technical researcher. Gather and compare the relevant options \
        or facts, state your sources' recency, and summarize what the evidence supports.",
    requires_freshness: true,
    knowledge_cutoff: cutoff(2025, 1, 15),
    freshness_query: "software technology landscape recent releases",
};

static DOCUMENTATION: RoleProfile = RoleProfile {
    id: "documentation",
    display_name: "Documentation Writer",
    domain: "developer documentation",
    scope: "READMEs, API docs, guides, changelogs",
    limitations: "documents behavior; does not redesign it",
    base_prompt: "You are a documentation expert. Produce clear, concise developer \
        documentation. Lead with what the reader needs to do, not with background.",
    requires_freshness: false,
    knowledge_cutoff: cutoff(2025, 4, 1),
    freshness_query: "developer documentation tooling updates",
};

static TEST_ENGINEER: RoleProfile = RoleProfile {
    id: "test-engineer",
    display_name: "Test Engineer",
    domain: "software testing",
    scope: "test design, coverage analysis, failure reproduction",
    limitations: "verifies behavior; does not decide requirements",
    base_prompt: "You are a test engineer. Design tests that pin down the stated behavior, \
        including the edge cases most likely to regress. Name each test after the behavior \
        it protects.",
    requires_freshness: false,
    knowledge_cutoff: cutoff(2025, 4, 1),
    freshness_query: "software testing framework updates",
};

/// Advisory expertise boundary, woven into the role prompt.
///
/// Enforcement is soft: the boundary instructs the model, nothing checks the
/// reply against it.
#[derive(Debug, Clone, Serialize)]
pub struct ExpertiseBoundary {
    /// Domain of expertise
    pub domain: &'static str,
    /// What the role takes on
    pub scope: &'static str,
    /// What the role defers on
    pub limitations: &'static str,
    /// Date after which the role's static knowledge may be stale
    pub knowledge_cutoff: NaiveDate,
}

/// Static catalog of role definitions and expertise boundaries
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentRegistry;

impl AgentRegistry {
    /// Create the registry
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve a wire id to a role, failing on unknown ids
    pub fn resolve(&self, id: &str) -> Result<Role> {
        Role::from_id(id).ok_or_else(|| Error::RoleNotFound {
            role: id.to_string(),
        })
    }

    /// Get the profile for a role
    #[must_use]
    pub fn profile(&self, role: Role) -> &'static RoleProfile {
        match role {
            Role::Generalist => &GENERALIST,
            Role::CodeAnalyzer => &CODE_ANALYZER,
            Role::Architect => &ARCHITECT,
            Role::SecurityExpert => &SECURITY_EXPERT,
            Role::Researcher => &RESEARCHER,
            Role::Documentation => &DOCUMENTATION,
            Role::TestEngineer => &TEST_ENGINEER,
        }
    }

    /// Get the expertise boundary for a role
    #[must_use]
    pub fn boundary(&self, role: Role) -> ExpertiseBoundary {
        let profile = self.profile(role);
        ExpertiseBoundary {
            domain: profile.domain,
            scope: profile.scope,
            limitations: profile.limitations,
            knowledge_cutoff: profile.knowledge_cutoff,
        }
    }

    /// All roles in the catalog
    #[must_use]
    pub fn roles(&self) -> &'static [Role] {
        Role::ALL
    }

    /// The default role for fallback decompositions
    #[must_use]
    pub fn default_role(&self) -> Role {
        Role::Generalist
    }
}
