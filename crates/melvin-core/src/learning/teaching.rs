//! Teaching-file lexer/parser. Line-oriented: block tags begin
//! with `#` followed by an uppercase keyword; non-tag lines belong to the
//! block currently open. Grounded on the original `teaching_format`
//! lexer's tag-then-payload state machine.

/// Per-block metadata carried by a `#WEIGHT` block into whatever block
/// follows it.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    pub line: usize,
    pub confidence: f32,
    pub temporal: Option<String>,
    pub source: Option<String>,
}

impl Meta {
    fn at_line(line: usize) -> Self {
        Self {
            line,
            confidence: 1.0,
            temporal: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fact {
    pub subj: String,
    pub rel: String,
    pub obj: String,
    pub meta: Meta,
}

#[derive(Debug, Clone)]
pub struct Association {
    pub left: String,
    pub rel: String,
    pub right: String,
    pub bidirectional: bool,
    pub meta: Meta,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: String,
    pub implies: String,
    pub meta: Meta,
}

#[derive(Debug, Clone)]
pub struct Query {
    pub question: String,
    pub expects: Vec<String>,
    pub meta: Meta,
}

#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub query: Option<Query>,
}

/// One parsed teaching-document block. `Weight` and `Expect`
/// tags never surface here: the former is folded into the following
/// block's [`Meta`], the latter is merged into the preceding `Query`.
#[derive(Debug, Clone)]
pub enum Block {
    Fact(Fact),
    Association(Association),
    Rule(Rule),
    Query(Query),
    Test(TestCase),
    Explain(String),
    Source(String),
}

#[derive(Debug, Clone, Default)]
pub struct TeachingDocument {
    pub blocks: Vec<Block>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Fact,
    Association,
    Rule,
    Query,
    Expect,
    Test,
    Explain,
    Source,
    Weight,
    Unknown,
}

struct RawBlock {
    kind: BlockKind,
    payload: String,
    meta: Meta,
    test_name: Option<String>,
}

pub(crate) fn parse_tag(line: &str) -> BlockKind {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return BlockKind::Unknown;
    }
    let rest = trimmed[1..].trim();
    let tag = rest.split_whitespace().next().unwrap_or("").to_lowercase();
    match tag.as_str() {
        "fact" => BlockKind::Fact,
        "association" | "assoc" => BlockKind::Association,
        "rule" => BlockKind::Rule,
        "query" | "q" => BlockKind::Query,
        "expect" | "expected" => BlockKind::Expect,
        "test" => BlockKind::Test,
        "explain" | "explanation" => BlockKind::Explain,
        "source" | "src" => BlockKind::Source,
        "weight" | "meta" => BlockKind::Weight,
        _ => BlockKind::Unknown,
    }
}

pub(crate) fn is_bidirectional_marker(text: &str) -> bool {
    text.contains('\u{2194}') || text.contains("<->")
}

/// `SUBJ REL OBJ`: first token is the subject, last the object, everything
/// between (with arrows stripped) is the relation text.
pub(crate) fn parse_relation(text: &str) -> Option<(String, String, String)> {
    let cleaned = text.replace('\u{2192}', " ").replace("->", " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }
    let subj = tokens[0].to_string();
    let obj = tokens[tokens.len() - 1].to_string();
    let rel = tokens[1..tokens.len() - 1].join(" ");
    Some((subj, rel, obj))
}

/// `IF pattern THEN implication`.
pub(crate) fn parse_rule_text(text: &str) -> Option<(String, String)> {
    let lower = text.to_lowercase();
    let if_pos = lower.find("if ")?;
    let then_pos = lower.find(" then ")?;
    if then_pos <= if_pos {
        return None;
    }
    let pattern = text[if_pos + 3..then_pos].trim().to_string();
    let implies = text[then_pos + 6..].trim().to_string();
    if pattern.is_empty() || implies.is_empty() {
        None
    } else {
        Some((pattern, implies))
    }
}

/// `confidence:0.9 temporal:"2026-01-01" source:wiki` key:value tokens.
fn apply_weight_hint(text: &str, meta: &mut Meta) {
    for token in text.split_whitespace() {
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };
        let value = value.trim_matches('"');
        match key {
            "confidence" => {
                if let Ok(v) = value.parse::<f32>() {
                    meta.confidence = v;
                }
            }
            "temporal" => meta.temporal = Some(value.to_string()),
            "source" => meta.source = Some(value.to_string()),
            _ => {}
        }
    }
}

fn flush_raw(
    kind: BlockKind,
    payload: &[String],
    meta: Meta,
    test_name: Option<String>,
    out: &mut Vec<RawBlock>,
) {
    if kind == BlockKind::Unknown || (payload.is_empty() && kind != BlockKind::Test) {
        return;
    }
    out.push(RawBlock {
        kind,
        payload: payload.join("\n"),
        meta,
        test_name,
    });
}

/// Parse a teaching document, accumulating per-block errors/warnings
/// rather than failing on the first bad block.
pub fn parse(content: &str) -> TeachingDocument {
    let mut raw: Vec<RawBlock> = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let mut current_kind = BlockKind::Unknown;
    let mut current_payload: Vec<String> = Vec::new();
    let mut current_meta = Meta::at_line(0);
    let mut current_test_name: Option<String> = None;

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('#') && trimmed.len() > 1 {
            if current_kind == BlockKind::Weight {
                apply_weight_hint(&current_payload.join(" "), &mut current_meta);
            } else {
                flush_raw(
                    current_kind,
                    &current_payload,
                    std::mem::replace(&mut current_meta, Meta::at_line(line_no)),
                    current_test_name.take(),
                    &mut raw,
                );
            }
            current_payload.clear();
            current_kind = parse_tag(trimmed);
            if current_kind == BlockKind::Test {
                let rest = trimmed[1..].trim();
                current_test_name = rest
                    .split_once(char::is_whitespace)
                    .map(|(_, name)| name.trim().to_string())
                    .filter(|s| !s.is_empty());
            }
            continue;
        }

        if current_kind == BlockKind::Unknown {
            continue;
        }
        current_payload.push(trimmed.to_string());
    }
    if current_kind == BlockKind::Weight {
        apply_weight_hint(&current_payload.join(" "), &mut current_meta);
    } else {
        flush_raw(current_kind, &current_payload, current_meta, current_test_name, &mut raw);
    }

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let block = &raw[i];
        match block.kind {
            BlockKind::Fact => {
                if let Some((subj, rel, obj)) = parse_relation(&block.payload) {
                    blocks.push(Block::Fact(Fact {
                        subj,
                        rel,
                        obj,
                        meta: block.meta.clone(),
                    }));
                } else {
                    errors.push(format!("line {}: failed to parse FACT relation", block.meta.line));
                }
                i += 1;
            }
            BlockKind::Association => {
                if let Some((left, rel, right)) = parse_relation(&block.payload) {
                    blocks.push(Block::Association(Association {
                        left,
                        rel,
                        right,
                        bidirectional: is_bidirectional_marker(&block.payload),
                        meta: block.meta.clone(),
                    }));
                } else {
                    errors.push(format!("line {}: failed to parse ASSOCIATION", block.meta.line));
                }
                i += 1;
            }
            BlockKind::Rule => {
                if let Some((pattern, implies)) = parse_rule_text(&block.payload) {
                    blocks.push(Block::Rule(Rule {
                        pattern,
                        implies,
                        meta: block.meta.clone(),
                    }));
                } else {
                    errors.push(format!(
                        "line {}: failed to parse RULE (need IF...THEN...)",
                        block.meta.line
                    ));
                }
                i += 1;
            }
            BlockKind::Query => {
                let (query, consumed) = merge_query(&raw, i, &mut warnings);
                blocks.push(Block::Query(query));
                i += consumed;
            }
            BlockKind::Test => {
                let name = block.test_name.clone().unwrap_or_default();
                if i + 1 < raw.len() && raw[i + 1].kind == BlockKind::Query {
                    let (query, consumed) = merge_query(&raw, i + 1, &mut warnings);
                    blocks.push(Block::Test(TestCase {
                        name,
                        query: Some(query),
                    }));
                    i += 1 + consumed;
                } else {
                    blocks.push(Block::Test(TestCase { name, query: None }));
                    i += 1;
                }
            }
            BlockKind::Explain => {
                blocks.push(Block::Explain(block.payload.clone()));
                i += 1;
            }
            BlockKind::Source => {
                blocks.push(Block::Source(block.payload.clone()));
                i += 1;
            }
            BlockKind::Expect => {
                warnings.push(format!("line {}: EXPECT without QUERY", block.meta.line));
                i += 1;
            }
            BlockKind::Weight | BlockKind::Unknown => {
                i += 1;
            }
        }
    }

    TeachingDocument {
        blocks,
        errors,
        warnings,
    }
}

fn merge_query(raw: &[RawBlock], idx: usize, warnings: &mut Vec<String>) -> (Query, usize) {
    let block = &raw[idx];
    let question = block.payload.trim().to_string();
    let mut expects = Vec::new();
    let mut consumed = 1;
    if idx + 1 < raw.len() && raw[idx + 1].kind == BlockKind::Expect {
        for answer in raw[idx + 1].payload.split(',') {
            let answer = answer.trim();
            if !answer.is_empty() {
                expects.push(answer.to_string());
            }
        }
        consumed = 2;
    } else {
        warnings.push(format!("line {}: QUERY without EXPECT", block.meta.line));
    }
    (
        Query {
            question,
            expects,
            meta: block.meta.clone(),
        },
        consumed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fact_block() {
        let doc = parse("#FACT\ncats are mammals\n");
        assert_eq!(doc.blocks.len(), 1);
        match &doc.blocks[0] {
            Block::Fact(f) => {
                assert_eq!(f.subj, "cats");
                assert_eq!(f.rel, "are");
                assert_eq!(f.obj, "mammals");
            }
            other => panic!("expected Fact, got {other:?}"),
        }
    }

    #[test]
    fn merges_query_with_following_expect() {
        let doc = parse("#QUERY\nwhat are cats\n#EXPECT\nmammals, animals\n");
        assert_eq!(doc.blocks.len(), 1);
        match &doc.blocks[0] {
            Block::Query(q) => {
                assert_eq!(q.question, "what are cats");
                assert_eq!(q.expects, vec!["mammals", "animals"]);
            }
            other => panic!("expected Query, got {other:?}"),
        }
    }

    #[test]
    fn association_detects_bidirectional_marker() {
        let doc = parse("#ASSOC\ncats <-> pets\n");
        match &doc.blocks[0] {
            Block::Association(a) => assert!(a.bidirectional),
            other => panic!("expected Association, got {other:?}"),
        }
    }

    #[test]
    fn weight_block_sets_confidence_on_next_block() {
        let doc = parse("#WEIGHT\nconfidence:0.42\n#FACT\ncats are mammals\n");
        match &doc.blocks[0] {
            Block::Fact(f) => assert!((f.meta.confidence - 0.42).abs() < 1e-6),
            other => panic!("expected Fact, got {other:?}"),
        }
    }

    #[test]
    fn query_without_expect_warns_but_still_parses() {
        let doc = parse("#QUERY\nwhat are cats\n");
        assert_eq!(doc.blocks.len(), 1);
        assert!(doc.warnings.iter().any(|w| w.contains("without EXPECT")));
    }

    #[test]
    fn malformed_fact_is_reported_as_error_not_panic() {
        let doc = parse("#FACT\njust one token\n");
        assert!(doc.blocks.is_empty());
        assert_eq!(doc.errors.len(), 1);
    }
}
