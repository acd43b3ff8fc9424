//! Tenant-scoped session policies.
//!
//! A policy is built as a typed document and serialized with `serde_json`, so
//! no tenant ID can break out of its JSON string. Wildcard metacharacters in a
//! tenant ID are written with the IAM literal escapes (`${*}`, `${?}`, `${$}`)
//! so a tenant named `a*` is confined to keys starting with `a*-` and not to
//! every key starting with `a`.
//!
//! [`PolicyDocument::permits`] evaluates the subset of IAM semantics these
//! documents use. It backs the in-memory store that tests run against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::contract::stable_contract_json;
use crate::sharding::tenant_prefix;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const GET_ITEM_ACTION: &str = "dynamodb:GetItem";
pub const PUT_ITEM_ACTION: &str = "dynamodb:PutItem";
pub const FOR_ALL_VALUES_STRING_LIKE: &str = "ForAllValues:StringLike";
pub const LEADING_KEYS_CONDITION_KEY: &str = "dynamodb:LeadingKeys";

/// Condition operator → condition key → allowed patterns.
pub type ConditionBlock = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub action: Vec<String>,
    pub resource: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub condition: ConditionBlock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

pub fn build_policy(tenant_id: &str, table_arn: &str) -> PolicyDocument {
    let leading_key_pattern = format!("{}*", escape_literal(&tenant_prefix(tenant_id)));
    let condition = BTreeMap::from([(
        FOR_ALL_VALUES_STRING_LIKE.to_string(),
        BTreeMap::from([(
            LEADING_KEYS_CONDITION_KEY.to_string(),
            vec![leading_key_pattern],
        )]),
    )]);

    PolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: vec![PolicyStatement {
            effect: Effect::Allow,
            action: vec![GET_ITEM_ACTION.to_string(), PUT_ITEM_ACTION.to_string()],
            resource: vec![table_arn.to_string()],
            condition,
        }],
    }
}

impl PolicyDocument {
    pub fn to_json(&self) -> String {
        stable_contract_json(self)
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json());
        format!("{:x}", hasher.finalize())
    }

    /// Whether `action` on `resource` for partition key `leading_key` is allowed.
    ///
    /// An explicit deny wins; otherwise at least one allow statement must match.
    pub fn permits(&self, action: &str, resource: &str, leading_key: &str) -> bool {
        let matching = |statement: &&PolicyStatement| {
            statement.action.iter().any(|pattern| string_like(pattern, action))
                && statement
                    .resource
                    .iter()
                    .any(|pattern| string_like(pattern, resource))
                && conditions_hold(&statement.condition, leading_key)
        };

        let mut allowed = false;
        for statement in self.statement.iter().filter(matching) {
            match statement.effect {
                Effect::Deny => return false,
                Effect::Allow => allowed = true,
            }
        }
        allowed
    }
}

fn conditions_hold(condition: &ConditionBlock, leading_key: &str) -> bool {
    condition.iter().all(|(operator, keys)| {
        if operator != FOR_ALL_VALUES_STRING_LIKE {
            return false;
        }
        keys.iter().all(|(key, patterns)| {
            key == LEADING_KEYS_CONDITION_KEY
                && patterns
                    .iter()
                    .any(|pattern| string_like(pattern, leading_key))
        })
    })
}

fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '*' => escaped.push_str("${*}"),
            '?' => escaped.push_str("${?}"),
            '$' => escaped.push_str("${$}"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternToken {
    Literal(char),
    AnySequence,
    AnyCharacter,
}

fn tokenize(pattern: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(character) = rest.chars().next() {
        let literal = ["${*}", "${?}", "${$}"]
            .iter()
            .find(|escape| rest.starts_with(**escape));
        if let Some(escape) = literal {
            tokens.push(PatternToken::Literal(escape.as_bytes()[2] as char));
            rest = &rest[escape.len()..];
            continue;
        }
        tokens.push(match character {
            '*' => PatternToken::AnySequence,
            '?' => PatternToken::AnyCharacter,
            other => PatternToken::Literal(other),
        });
        rest = &rest[character.len_utf8()..];
    }
    tokens
}

/// Case-sensitive IAM `StringLike` match.
fn string_like(pattern: &str, value: &str) -> bool {
    let tokens = tokenize(pattern);
    let chars: Vec<char> = value.chars().collect();

    let (mut token_idx, mut char_idx) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;

    while char_idx < chars.len() {
        match tokens.get(token_idx) {
            Some(PatternToken::AnySequence) => {
                backtrack = Some((token_idx, char_idx));
                token_idx += 1;
            }
            Some(PatternToken::AnyCharacter) => {
                token_idx += 1;
                char_idx += 1;
            }
            Some(PatternToken::Literal(expected)) if *expected == chars[char_idx] => {
                token_idx += 1;
                char_idx += 1;
            }
            _ => match backtrack {
                Some((star_idx, star_char_idx)) => {
                    token_idx = star_idx + 1;
                    char_idx = star_char_idx + 1;
                    backtrack = Some((star_idx, star_char_idx + 1));
                }
                None => return false,
            },
        }
    }

    tokens[token_idx..]
        .iter()
        .all(|token| *token == PatternToken::AnySequence)
}
