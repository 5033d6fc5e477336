//! Tag scheme conversions.
//!
//! Extraction produces IOB tags. Training files use the BIOES vocabulary,
//! which is BILOU with `U-` spelled `S-` and `L-` spelled `E-`.

use super::tokenizer::OUTSIDE;

/// Split a tag into prefix and entity type. `O` has no type.
pub fn split_tag(tag: &str) -> (&str, Option<&str>) {
    match tag.split_once('-') {
        Some((prefix, label)) => (prefix, Some(label)),
        None => (tag, None),
    }
}

/// Convert IOB tags into BILOU. An `I-` tag that does not continue an entity
/// of the same type opens a new one.
pub fn iob_to_bilou<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut output = Vec::with_capacity(tags.len());
    for (idx, tag) in tags.iter().enumerate() {
        let (prefix, label) = split_tag(tag.as_ref());
        let Some(label) = label else {
            output.push(OUTSIDE.to_string());
            continue;
        };
        let continues = prefix == "I"
            && idx > 0
            && matches!(split_tag(tags[idx - 1].as_ref()), ("B" | "I", Some(prev)) if prev == label);
        let next_continues = tags
            .get(idx + 1)
            .map(|next| matches!(split_tag(next.as_ref()), ("I", Some(next)) if next == label))
            .unwrap_or(false);
        let bilou = match (continues, next_continues) {
            (false, false) => "U",
            (false, true) => "B",
            (true, true) => "I",
            (true, false) => "L",
        };
        output.push(format!("{bilou}-{label}"));
    }
    output
}

/// Rename BILOU unit/last prefixes to their BIOES spelling.
pub fn bilou_to_bioes<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|tag| match split_tag(tag.as_ref()) {
            ("U", Some(label)) => format!("S-{label}"),
            ("L", Some(label)) => format!("E-{label}"),
            _ => tag.as_ref().to_string(),
        })
        .collect()
}

pub fn iob_to_bioes<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    bilou_to_bioes(iob_to_bilou(tags).as_slice())
}
