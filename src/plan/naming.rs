use std::collections::{HashMap, HashSet};

use crate::foundation::ids::NodeId;
use crate::foundation::sort::alphanumeric_cmp;
use crate::scene::model::{ObjectBody, SceneObject};

/// UpperCamel identifier built from a free-form label.
///
/// Words are split on anything that is not ASCII alphanumeric. Returns `None` when no usable
/// character remains.
pub fn sanitize(label: &str) -> Option<String> {
    let mut out = String::with_capacity(label.len());
    for word in label.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.is_empty() {
        return None;
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    Some(out)
}

/// Name stem of an object before collision handling.
pub fn base_name(obj: &SceneObject) -> String {
    if let Some(name) = obj.description.short.as_deref().and_then(sanitize) {
        return name;
    }
    match &obj.body {
        ObjectBody::ColorBrush(b) => match b.color {
            Some(c) => format!("ColorBrush_{}", c.hex()),
            None => "ColorBrush".to_string(),
        },
        _ => obj.kind().name().to_string(),
    }
}

fn claim_suffixed(base: &str, next: &mut usize, taken: &mut HashSet<String>) -> String {
    loop {
        let candidate = format!("{base}_{next}");
        *next += 1;
        if taken.insert(candidate.clone()) {
            return candidate;
        }
    }
}

/// Give every candidate a unique name.
///
/// `candidates` must be in discovery order. Candidates sharing a base form a group; groups
/// are claimed in alphanumeric order of their base. A lone member keeps the bare base when it
/// is still free, larger groups number their members `_0`, `_1`, ... in discovery order.
/// Names already in `taken` are skipped, and every assigned name is added to it.
pub fn assign_names(
    candidates: &[(NodeId, String)],
    taken: &mut HashSet<String>,
) -> HashMap<NodeId, String> {
    let mut groups: HashMap<&str, Vec<NodeId>> = HashMap::new();
    for (id, base) in candidates {
        groups.entry(base.as_str()).or_default().push(*id);
    }
    let mut bases: Vec<&str> = groups.keys().copied().collect();
    bases.sort_by(|a, b| alphanumeric_cmp(a, b));

    let mut names = HashMap::with_capacity(candidates.len());
    for base in bases {
        let members = &groups[base];
        let mut next = 0usize;
        if let [only] = members.as_slice() {
            let name = if taken.insert(base.to_string()) {
                base.to_string()
            } else {
                claim_suffixed(base, &mut next, taken)
            };
            names.insert(*only, name);
            continue;
        }
        for id in members {
            names.insert(*id, claim_suffixed(base, &mut next, taken));
        }
    }
    names
}

/// Reserve a single name, suffixing it when `base` is already taken.
pub fn claim_name(base: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut next = 0usize;
    claim_suffixed(base, &mut next, taken)
}

#[cfg(test)]
#[path = "../../tests/unit/plan/naming.rs"]
mod tests;
