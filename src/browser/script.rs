//! DOM helper scripts evaluated in the page
//!
//! Every script is a self-contained expression. Locators and node paths are
//! embedded as JSON literals so selector text never needs manual escaping.

use crate::browser::NodeHandle;
use crate::config::Locator;
use serde_json::{json, Value};

const PRELUDE: &str = r#"
const __find = (ctx, kind, sel) => {
  if (kind === 'xpath') {
    const r = document.evaluate(sel, ctx, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const out = [];
    for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i));
    return out;
  }
  if (kind === 'id') return Array.from(ctx.querySelectorAll('#' + CSS.escape(sel)));
  return Array.from(ctx.querySelectorAll(sel));
};
const __resolve = (steps) => {
  let ctx = document;
  for (const [kind, sel, pos] of steps) {
    const found = __find(ctx, kind, sel);
    if (found.length <= pos) return null;
    ctx = found[pos];
  }
  return ctx;
};
const __visible = (el) => !!el
  && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)
  && getComputedStyle(el).visibility !== 'hidden';
const __text = (el) => ((el.innerText ?? el.textContent) || '').trim();
"#;

fn wrap(body: String) -> String {
    format!("(() => {{{}\n{}\n}})()", PRELUDE, body)
}

fn locator_literal(locator: &Locator) -> String {
    json!([locator.kind(), locator.value()]).to_string()
}

fn steps_literal(node: &NodeHandle) -> String {
    let steps: Vec<Value> = node
        .steps()
        .iter()
        .map(|(locator, position)| json!([locator.kind(), locator.value(), position]))
        .collect();
    Value::Array(steps).to_string()
}

/// `true` when `locator` is present in the document
pub fn is_present(locator: &Locator) -> String {
    wrap(format!(
        "const [k, s] = {}; return __find(document, k, s).length > 0;",
        locator_literal(locator)
    ))
}

/// Position of the first visible match of `locator`, or -1
pub fn first_visible(locator: &Locator) -> String {
    wrap(format!(
        "const [k, s] = {}; return __find(document, k, s).findIndex(__visible);",
        locator_literal(locator)
    ))
}

/// Clicks the first visible match of `locator` through the DOM; `true` on success
pub fn click_first_visible(locator: &Locator) -> String {
    wrap(format!(
        "const [k, s] = {}; const el = __find(document, k, s).find(__visible); \
         if (!el) return false; el.click(); return true;",
        locator_literal(locator)
    ))
}

/// Number of matches of `locator`, inside `scope` when given
pub fn count(scope: Option<&NodeHandle>, locator: &Locator) -> String {
    let root = match scope {
        Some(node) => format!("__resolve({})", steps_literal(node)),
        None => "document".to_string(),
    };
    wrap(format!(
        "const root = {}; if (!root) return 0; const [k, s] = {}; return __find(root, k, s).length;",
        root,
        locator_literal(locator)
    ))
}

/// Trimmed text of the first `sub` match inside `node`
///
/// Evaluates to a one-element array, or an empty one when nothing matches.
pub fn text(node: &NodeHandle, sub: &Locator) -> String {
    wrap(format!(
        "const root = __resolve({}); if (!root) return []; const [k, s] = {}; \
         const el = __find(root, k, s)[0]; return el ? [__text(el)] : [];",
        steps_literal(node),
        locator_literal(sub)
    ))
}

/// Trimmed texts of every `sub` match inside `node`
pub fn texts(node: &NodeHandle, sub: &Locator) -> String {
    wrap(format!(
        "const root = __resolve({}); if (!root) return []; const [k, s] = {}; \
         return __find(root, k, s).map(__text);",
        steps_literal(node),
        locator_literal(sub)
    ))
}

/// Attribute of the first `sub` match inside `node`, as a zero- or one-element array
///
/// String-valued DOM properties win over the raw attribute, so `src`/`href`
/// come back as absolute URLs.
pub fn attribute(node: &NodeHandle, sub: &Locator, attr: &str) -> String {
    wrap(format!(
        "const root = __resolve({}); if (!root) return []; const [k, s] = {}; \
         const a = {}; const el = __find(root, k, s)[0]; if (!el) return []; \
         const prop = el[a]; if (typeof prop === 'string' && prop) return [prop]; \
         const v = el.getAttribute(a); return v === null ? [] : [v];",
        steps_literal(node),
        locator_literal(sub),
        Value::String(attr.to_string())
    ))
}
