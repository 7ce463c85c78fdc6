use crate::datasets::DatasetStore;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static EMPLOYEE_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(jane\s+doe|john\s+smith|sara\s+khan|michael\s+chen|emily\s+johnson|david\s+wilson|priya\s+patel|robert\s+garcia|jennifer\s+lee|thomas\s+wright|olivia\s+martinez|nathan\s+thompson)\b",
    )
    .unwrap()
});

static COMPANY_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(global\s+tech|pinnacle\s+financial|healthfirst\s+networks|retail\s+revolution|innovate\s+manufacturing|fasttrack\s+logistics|creative\s+solutions|greentech\s+energy)\b",
    )
    .unwrap()
});

static NAME_AFTER_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:employee|staff|person)\s+"?([\w][\w\s.-]*)"?"#).unwrap());

static COMPANY_AFTER_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:customer|client|company)\s+"?([\w][\w\s.-]*)"?"#).unwrap());

static QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bq([1-4])\b").unwrap());

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(2023|2024)\b").unwrap());

/// A single context-selection heuristic. Rules are evaluated in order; the
/// first rule whose predicate matches AND whose fetch yields data wins.
struct Rule {
    name: &'static str,
    applies: fn(&str) -> bool,
    fetch: fn(&ContextSelector, &str) -> Option<Value>,
}

const RULES: &[Rule] = &[
    Rule {
        name: "employee",
        applies: |p| {
            p.contains("employee") || p.contains("staff") || EMPLOYEE_NAMES.is_match(p)
        },
        fetch: ContextSelector::fetch_employee,
    },
    Rule {
        name: "customer",
        applies: |p| {
            p.contains("customer") || p.contains("client") || COMPANY_NAMES.is_match(p)
        },
        fetch: ContextSelector::fetch_customer,
    },
    Rule {
        name: "sales_quarter",
        applies: |p| {
            (p.contains("sales") || p.contains("revenue"))
                && QUARTER.is_match(p)
                && YEAR.is_match(p)
        },
        fetch: ContextSelector::fetch_sales_quarter,
    },
    Rule {
        name: "sales_targets",
        applies: |p| p.contains("target"),
        fetch: |selector, _| selector.fetch_whole(crate::datasets::SALES_TARGETS),
    },
    Rule {
        name: "sales_data",
        applies: |p| p.contains("sales") || p.contains("revenue"),
        fetch: |selector, _| selector.fetch_whole(crate::datasets::SALES_DATA),
    },
    Rule {
        name: "teams",
        applies: |p| p.contains("team"),
        fetch: |selector, _| selector.fetch_whole(crate::datasets::TEAMS),
    },
];

/// Inspects a prompt with ordered keyword heuristics and picks at most one
/// dataset (or record) to ground the model's answer on. Pure read; lookup
/// failures degrade to "no context".
pub struct ContextSelector {
    store: DatasetStore,
}

impl ContextSelector {
    pub fn new(store: DatasetStore) -> Self {
        Self { store }
    }

    /// Returns the selected context compactly serialized, or None.
    pub fn select(&self, prompt: &str) -> Option<String> {
        let data = self.select_value(prompt)?;
        serde_json::to_string(&data).ok()
    }

    /// The selected context as a JSON value, before serialization.
    pub fn select_value(&self, prompt: &str) -> Option<Value> {
        let normalized = prompt.to_lowercase();
        for rule in RULES {
            if !(rule.applies)(&normalized) {
                continue;
            }
            if let Some(data) = (rule.fetch)(self, &normalized) {
                debug!(rule = rule.name, "context rule selected");
                return Some(data);
            }
        }
        None
    }

    fn fetch_employee(&self, prompt: &str) -> Option<Value> {
        let name = Self::extract_capture(&EMPLOYEE_NAMES, prompt)
            .or_else(|| Self::extract_capture(&NAME_AFTER_KEYWORD, prompt))?;
        self.store.employee_by_name(&name)
    }

    fn fetch_customer(&self, prompt: &str) -> Option<Value> {
        let name = Self::extract_capture(&COMPANY_NAMES, prompt)
            .or_else(|| Self::extract_capture(&COMPANY_AFTER_KEYWORD, prompt))?;
        self.store.customer_by_name(&name)
    }

    fn fetch_sales_quarter(&self, prompt: &str) -> Option<Value> {
        let quarter_digit = QUARTER.captures(prompt)?.get(1)?.as_str().to_string();
        let year: i64 = YEAR.captures(prompt)?.get(1)?.as_str().parse().ok()?;
        let records = self.store.sales_for_quarter(&format!("Q{}", quarter_digit), year);
        if records.is_empty() {
            None
        } else {
            Some(Value::Array(records))
        }
    }

    fn fetch_whole(&self, dataset: &str) -> Option<Value> {
        let records = self.store.dataset(dataset);
        if records.is_empty() {
            None
        } else {
            Some(Value::Array(records))
        }
    }

    fn extract_capture(pattern: &Regex, prompt: &str) -> Option<String> {
        let raw = pattern.captures(prompt)?.get(1)?.as_str();
        let cleaned = raw.trim().trim_end_matches(['?', '.', '!', ',', '"']).trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.to_string())
        }
    }
}
