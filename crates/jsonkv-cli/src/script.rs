//! Operation scripts.
//!
//! One command per line: `OPERATION key [path] [args...]`. Blank lines and
//! lines starting with `#` are skipped. Arguments are separated by
//! whitespace outside JSON strings, arrays and objects, so
//! `JSON.SET doc a.b {"x": [1, 2]}` has four tokens.

use anyhow::{anyhow, bail, Context};
use jsonkv_client::{JsonClient, Materialization, SetCondition, SetOptions};
use jsonkv_protocol::Operation;
use jsonkv_types::normalize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the script.
    pub number: usize,
    pub operation: String,
    pub args: Vec<String>,
}

pub fn parse(text: &str) -> anyhow::Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens = tokenize(trimmed).with_context(|| format!("line {}", i + 1))?;
        let operation = tokens.remove(0);
        lines.push(ScriptLine {
            number: i + 1,
            operation,
            args: tokens,
        });
    }
    Ok(lines)
}

fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in line.chars() {
        if in_string {
            current.push(c);
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '"' => {
                in_string = true;
                current.push(c);
            }
            '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ']' | '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("unbalanced '{c}'"))?;
                current.push(c);
            }
            c => current.push(c),
        }
    }
    if in_string {
        bail!("unterminated string");
    }
    if depth != 0 {
        bail!("unbalanced brackets");
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Result of one executed line.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub value: Value,
    pub materialization: Option<Materialization>,
}

impl Outcome {
    fn plain(value: Value) -> Self {
        Self {
            value,
            materialization: None,
        }
    }
}

/// Run one line through `client`, normalizing its path arguments.
pub async fn execute(
    client: &JsonClient,
    line: &ScriptLine,
    auto_create: bool,
) -> anyhow::Result<Outcome> {
    let mut args = line.args.clone();
    let Some(operation) = Operation::from_name(&line.operation) else {
        // Let the dispatcher reject it.
        let value = client.invoke(&line.operation, args).await?;
        return Ok(Outcome::plain(value));
    };

    match operation {
        Operation::Set => {
            let [key, path, value, rest @ ..] = args.as_slice() else {
                bail!("{operation} needs a key, a path and a value");
            };
            let value: Value = serde_json::from_str(value)
                .with_context(|| format!("invalid JSON value {value}"))?;
            let condition = match rest {
                [] => SetCondition::Always,
                [flag] => SetCondition::from_flag(flag)
                    .ok_or_else(|| anyhow!("unknown condition {flag}"))?,
                _ => bail!("{operation} takes at most one condition"),
            };
            let options = SetOptions::new()
                .auto_create(auto_create || client.config().auto_create)
                .condition(condition);
            let result = client.set_with(key, path.as_str(), value, options).await?;
            Ok(Outcome {
                value: result.reply,
                materialization: result.materialization,
            })
        }
        Operation::MGet => {
            if let Some(path) = args.last_mut() {
                *path = normalize(path.as_str()).into_string();
            }
            Ok(Outcome::plain(client.invoke(operation.wire_name(), args).await?))
        }
        Operation::Debug => {
            if let Some(path) = args.get_mut(2) {
                *path = normalize(path.as_str()).into_string();
            }
            Ok(Outcome::plain(client.invoke(operation.wire_name(), args).await?))
        }
        _ => {
            if let Some(path) = args.get_mut(1) {
                *path = normalize(path.as_str()).into_string();
            }
            Ok(Outcome::plain(client.invoke(operation.wire_name(), args).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonkv_client::ClientError;
    use jsonkv_store::InMemoryJsonStore;
    use serde_json::json;
    use std::sync::Arc;

    fn line(text: &str) -> ScriptLine {
        parse(text).unwrap().remove(0)
    }

    #[test]
    fn tokenize_keeps_json_together() {
        assert_eq!(
            tokenize(r#"JSON.SET doc a.b {"x": [1, 2], "s": "a b"}"#).unwrap(),
            vec!["JSON.SET", "doc", "a.b", r#"{"x": [1, 2], "s": "a b"}"#]
        );
        assert_eq!(
            tokenize(r#"JSON.STRAPPEND doc s "quote \" inside""#).unwrap(),
            vec!["JSON.STRAPPEND", "doc", "s", r#""quote \" inside""#]
        );
    }

    #[test]
    fn tokenize_rejects_unbalanced() {
        assert!(tokenize("JSON.SET doc . {").is_err());
        assert!(tokenize("JSON.SET doc . ]").is_err());
        assert!(tokenize(r#"JSON.SET doc . "open"#).is_err());
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let lines = parse("# setup\n\nJSON.GET doc\n  JSON.TYPE doc a  \n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[1].operation, "JSON.TYPE");
        assert_eq!(lines[1].args, vec!["doc", "a"]);
    }

    #[test]
    fn parse_reports_line_number() {
        let err = parse("JSON.GET doc\nJSON.SET doc . {").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[tokio::test]
    async fn execute_normalizes_paths() {
        let store = Arc::new(InMemoryJsonStore::new());
        store.insert("doc", json!({"a": {"b": [5]}}));
        let client = JsonClient::new(store.clone());

        let out = execute(&client, &line("JSON.GET doc a.b.0"), false).await.unwrap();
        assert_eq!(out.value, json!(5));
        assert_eq!(store.calls()[0].args, vec!["doc", "['a']['b'][0]"]);

        let out = execute(&client, &line("JSON.MGET doc other a.b"), false).await.unwrap();
        assert_eq!(out.value, json!(["[5]", null]));

        let out = execute(&client, &line("JSON.DEBUG MEMORY doc a"), false).await.unwrap();
        assert_eq!(out.value, json!(9));
    }

    #[tokio::test]
    async fn execute_set_with_auto_create() {
        let store = Arc::new(InMemoryJsonStore::new());
        let client = JsonClient::new(store.clone());
        let set = line("JSON.SET doc a.b.c 42");

        let err = execute(&client, &set, false).await.unwrap_err();
        assert!(err.downcast_ref::<ClientError>().is_some());

        let out = execute(&client, &set, true).await.unwrap();
        assert_eq!(out.value, json!("OK"));
        assert!(out.materialization.is_some());
        assert_eq!(store.document("doc"), Some(json!({"a": {"b": {"c": 42}}})));

        let out = execute(&client, &line("JSON.SET doc a.b.c 1 NX"), false).await.unwrap();
        assert_eq!(out.value, Value::Null);
    }

    #[tokio::test]
    async fn execute_rejects_bad_lines() {
        let client = JsonClient::new(Arc::new(InMemoryJsonStore::new()));
        assert!(execute(&client, &line("JSON.SET doc a"), false).await.is_err());
        assert!(execute(&client, &line(r#"JSON.SET doc a {"a"}"#), false).await.is_err());
        assert!(execute(&client, &line("JSON.SET doc a oops"), false).await.is_err());
        assert!(parse("JSON.SET doc a {oops").is_err());
        assert!(execute(&client, &line("JSON.SET doc a 1 ZZ"), false).await.is_err());

        let err = execute(&client, &line("JSON.FORGET doc"), false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::UnsupportedOperation(_))
        ));
    }
}
