//! Keyword intent matching — maps free text onto one operation.
//!
//! This is deliberately simple substring matching, not language
//! understanding: the rule table is tested in declaration order and
//! the first rule with any trigger contained in the normalized query
//! wins. Ambiguous queries resolve to whichever rule comes first, so
//! the ordering below is part of the contract (plan before apply keeps
//! "what will change if I apply" a plan).

use tf_ops::Operation;

/// One dispatch rule: an operation and the substrings that trigger it.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub operation: Operation,
    pub triggers: &'static [&'static str],
}

/// The ordered rule table. Priority is declaration order; constructed
/// once, never mutated.
pub const RULES: &[KeywordRule] = &[
    KeywordRule {
        operation: Operation::Plan,
        triggers: &["plan", "what will change", "what changes", "visualize"],
    },
    KeywordRule {
        operation: Operation::StateList,
        triggers: &[
            "state list",
            "resources exist",
            "current state",
            "list all resources",
        ],
    },
    KeywordRule {
        operation: Operation::CostEstimate,
        triggers: &["cost", "expense", "price", "pricing", "how much"],
    },
    KeywordRule {
        operation: Operation::SecurityScan,
        triggers: &["security", "vulnerabilit", "secure", "issues"],
    },
    KeywordRule {
        operation: Operation::DriftCheck,
        triggers: &["drift", "changed since", "consistent"],
    },
    KeywordRule {
        operation: Operation::ListModules,
        triggers: &["list modules", "which modules", "modules in use"],
    },
    KeywordRule {
        operation: Operation::ListVariables,
        triggers: &["list variables", "what variables", "variables defined"],
    },
    KeywordRule {
        operation: Operation::ListOutputs,
        triggers: &["list outputs", "output values", "terraform outputs"],
    },
    KeywordRule {
        operation: Operation::ListProviders,
        triggers: &["list providers", "which providers", "providers in use"],
    },
    KeywordRule {
        operation: Operation::Show,
        triggers: &["show", "explain", "documentation", "what does"],
    },
    KeywordRule {
        operation: Operation::Status,
        triggers: &["status", "are you connected", "workspace access"],
    },
    KeywordRule {
        operation: Operation::Help,
        triggers: &["help", "what can you do", "usage"],
    },
    KeywordRule {
        operation: Operation::Init,
        triggers: &["init", "initialize", "set up the workspace"],
    },
    KeywordRule {
        operation: Operation::Apply,
        triggers: &["apply", "deploy", "create resources"],
    },
    KeywordRule {
        operation: Operation::Destroy,
        triggers: &["destroy", "tear down", "remove resources"],
    },
];

/// Match a free-text query against the rule table. First match wins;
/// `None` means the pass-through path should take over.
pub fn parse_query(query: &str) -> Option<Operation> {
    let normalized = query.to_lowercase();
    let normalized = normalized.trim();
    RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| normalized.contains(t)))
        .map(|rule| rule.operation)
}
