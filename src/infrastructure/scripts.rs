//! 页面脚本
//!
//! 所有对页面状态的读取和注入都通过这里的脚本完成。
//! 参数统一以 JSON 注入到 `__ARGS__`，脚本本身不拼接用户输入。

use serde_json::{json, Value as JsonValue};

/// 读取表格状态：数据区文本、数据行、加载提示是否可见
const GRID_STATE_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const visible = (el) => {
        if (!el) return false;
        const style = window.getComputedStyle(el);
        const rect = el.getBoundingClientRect();
        return style.display !== 'none' && style.visibility !== 'hidden' && rect.width > 0 && rect.height > 0;
    };
    const busy = visible(document.querySelector(args.busy));
    const db = document.querySelector(args.body);
    if (!db) return { present: false, text: '', rows: [], busy };

    const rows = [];
    for (const tr of db.querySelectorAll('tr')) {
        const tds = Array.from(tr.querySelectorAll('td'));
        if (!tds.length) continue;
        const targetTd = tr.querySelector("td[id$='" + args.targetSuffix + "']");
        rows.push({
            cells: tds.filter(td => td !== targetTd).map(td => td.innerText || ''),
            target: targetTd ? (targetTd.innerText || '') : null,
        });
    }
    return { present: true, text: (db.textContent || '').trim(), rows, busy };
})()
"#;

/// 读取输入框当前值
const FIELD_VALUE_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const el = document.querySelector(args.selector);
    return el ? String(el.value ?? '') : null;
})()
"#;

/// 直接赋值并派发 input / change 事件
const ASSIGN_FIELD_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const el = document.querySelector(args.selector);
    if (!el) return false;
    el.focus();
    el.value = '';
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.value = String(args.value ?? '');
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
})()
"#;

/// 下拉框选择指定值
const SELECT_VALUE_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const el = document.querySelector(args.selector);
    if (!el) return false;
    if (el.value === args.value) return true;
    el.value = args.value;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return el.value === args.value;
})()
"#;

/// 列出下拉框的全部选项
const LIST_OPTIONS_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const el = document.querySelector(args.selector);
    if (!el || !el.options) return [];
    return Array.from(el.options).map(o => ({ label: o.textContent || '', value: o.value }));
})()
"#;

/// 脚本点击
const SCRIPTED_CLICK_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const el = document.querySelector(args.selector);
    if (!el) return false;
    el.focus();
    el.click();
    return true;
})()
"#;

/// 元素中心点上最上层的元素是否就是它自己（没有被遮挡）
const IS_CLICKABLE_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const el = document.querySelector(args.selector);
    if (!el) return false;
    el.scrollIntoView({ block: 'center', inline: 'center' });
    const r = el.getBoundingClientRect();
    if (r.width === 0 || r.height === 0) return false;
    const top = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
    return !!top && (top === el || el.contains(top));
})()
"#;

/// 表格原始 HTML
const GRID_MARKUP_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const html = (sel) => { const n = document.querySelector(sel); return n ? n.outerHTML : ''; };
    return { header: html(args.header), body: html(args.body), table: html(args.table) };
})()
"#;

/// 点击第一个文本匹配且可见的按钮
const DISMISS_OVERLAY_JS: &str = r#"
(() => {
    const args = __ARGS__;
    const norm = s => (s || '').replace(/\s+/g, ' ').trim();
    const candidates = document.querySelectorAll('button, [role="button"], input[type="button"], input[type="submit"]');
    for (const el of candidates) {
        const label = norm(el.innerText || el.value);
        if (!args.labels.includes(label)) continue;
        const r = el.getBoundingClientRect();
        if (r.width === 0 || r.height === 0) continue;
        el.click();
        return true;
    }
    return false;
})()
"#;

/// 表格读取所需的选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridQuery {
    pub body: String,
    pub busy: String,
    pub target_suffix: String,
}

/// 一个页面脚本，附带参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScript {
    /// → `GridState`
    GridState(GridQuery),
    /// → `Option<String>`
    FieldValue { selector: String },
    /// → `bool`
    AssignField { selector: String, value: String },
    /// → `bool`
    SelectValue { selector: String, value: String },
    /// → `Vec<CourtOption>`
    ListOptions { selector: String },
    /// → `bool`
    ScriptedClick { selector: String },
    /// → `bool`
    IsClickable { selector: String },
    /// → `GridMarkup`
    GridMarkup {
        header: String,
        body: String,
        table: String,
    },
    /// → `bool`
    DismissOverlay { labels: Vec<String> },
}

impl PageScript {
    /// 脚本名称（日志用）
    pub fn name(&self) -> &'static str {
        match self {
            PageScript::GridState(_) => "grid_state",
            PageScript::FieldValue { .. } => "field_value",
            PageScript::AssignField { .. } => "assign_field",
            PageScript::SelectValue { .. } => "select_value",
            PageScript::ListOptions { .. } => "list_options",
            PageScript::ScriptedClick { .. } => "scripted_click",
            PageScript::IsClickable { .. } => "is_clickable",
            PageScript::GridMarkup { .. } => "grid_markup",
            PageScript::DismissOverlay { .. } => "dismiss_overlay",
        }
    }

    fn template_and_args(&self) -> (&'static str, JsonValue) {
        match self {
            PageScript::GridState(q) => (
                GRID_STATE_JS,
                json!({ "body": q.body, "busy": q.busy, "targetSuffix": q.target_suffix }),
            ),
            PageScript::FieldValue { selector } => (FIELD_VALUE_JS, json!({ "selector": selector })),
            PageScript::AssignField { selector, value } => (
                ASSIGN_FIELD_JS,
                json!({ "selector": selector, "value": value }),
            ),
            PageScript::SelectValue { selector, value } => (
                SELECT_VALUE_JS,
                json!({ "selector": selector, "value": value }),
            ),
            PageScript::ListOptions { selector } => (LIST_OPTIONS_JS, json!({ "selector": selector })),
            PageScript::ScriptedClick { selector } => {
                (SCRIPTED_CLICK_JS, json!({ "selector": selector }))
            }
            PageScript::IsClickable { selector } => (IS_CLICKABLE_JS, json!({ "selector": selector })),
            PageScript::GridMarkup {
                header,
                body,
                table,
            } => (
                GRID_MARKUP_JS,
                json!({ "header": header, "body": body, "table": table }),
            ),
            PageScript::DismissOverlay { labels } => {
                (DISMISS_OVERLAY_JS, json!({ "labels": labels }))
            }
        }
    }

    /// 生成可直接求值的 JS 表达式
    pub fn source(&self) -> String {
        let (template, args) = self.template_and_args();
        template.replace("__ARGS__", &args.to_string())
    }
}
