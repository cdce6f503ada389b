use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::subscription::{
    subscription_id_from_name, BillingCycle, SubscriptionCategory, SubscriptionRecord,
    DEFAULT_CURRENCY, DEFAULT_ICON,
};

/// One tokenized record from a source file, as ordered header/cell pairs.
/// Pairs rather than a map so equivalently-named columns resolve in column
/// order (last match wins).
pub type RawRow = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Name,
    Category,
    Price,
    Currency,
    BillingCycle,
    StartDate,
    NextBillingDate,
    Icon,
}

#[derive(Debug)]
pub struct FieldAliasSpec {
    field: FieldKey,
    aliases: &'static [&'static str],
}

#[derive(Debug)]
pub struct ValueAliasSpec<V: 'static> {
    value: V,
    aliases: &'static [&'static str],
}

const FIELD_ALIAS_SPECS: &[FieldAliasSpec] = &[
    FieldAliasSpec {
        field: FieldKey::Name,
        aliases: &[
            "name",
            "title",
            "service",
            "subscription",
            "名稱",
            "名称",
            "服務名稱",
            "服务名称",
            "訂閱名稱",
            "订阅名称",
        ],
    },
    FieldAliasSpec {
        field: FieldKey::Category,
        aliases: &["category", "type", "分類", "分类", "類別", "类别"],
    },
    FieldAliasSpec {
        field: FieldKey::Price,
        aliases: &[
            "price", "amount", "cost", "金額", "金额", "價格", "价格", "費用", "费用",
        ],
    },
    FieldAliasSpec {
        field: FieldKey::Currency,
        aliases: &["currency", "幣別", "币别", "貨幣", "货币"],
    },
    FieldAliasSpec {
        field: FieldKey::BillingCycle,
        aliases: &[
            "billing cycle",
            "billingcycle",
            "cycle",
            "週期",
            "周期",
            "扣款週期",
            "扣款周期",
            "訂閱週期",
            "订阅周期",
        ],
    },
    FieldAliasSpec {
        field: FieldKey::StartDate,
        aliases: &[
            "start date",
            "startdate",
            "start",
            "開始日期",
            "开始日期",
            "訂閱日期",
            "订阅日期",
        ],
    },
    FieldAliasSpec {
        field: FieldKey::NextBillingDate,
        aliases: &[
            "next billing date",
            "nextbillingdate",
            "next billing",
            "renewal date",
            "下次扣款日",
            "下次扣款日期",
            "下次付款日",
            "續訂日期",
            "续订日期",
        ],
    },
    FieldAliasSpec {
        field: FieldKey::Icon,
        aliases: &["icon", "圖示", "图标"],
    },
];

const CATEGORY_ALIAS_SPECS: &[ValueAliasSpec<SubscriptionCategory>] = &[
    ValueAliasSpec {
        value: SubscriptionCategory::Entertainment,
        aliases: &["entertainment", "娛樂", "娱乐", "影音", "串流"],
    },
    ValueAliasSpec {
        value: SubscriptionCategory::Productivity,
        aliases: &["productivity", "生產力", "生产力", "工作", "工具"],
    },
    ValueAliasSpec {
        value: SubscriptionCategory::Lifestyle,
        aliases: &["lifestyle", "生活", "健身"],
    },
    ValueAliasSpec {
        value: SubscriptionCategory::Other,
        aliases: &["other", "其他", "其它"],
    },
];

const CYCLE_ALIAS_SPECS: &[ValueAliasSpec<BillingCycle>] = &[
    ValueAliasSpec {
        value: BillingCycle::Weekly,
        aliases: &["weekly", "week", "每週", "每周", "週", "周"],
    },
    ValueAliasSpec {
        value: BillingCycle::Monthly,
        aliases: &["monthly", "month", "每月", "月"],
    },
    ValueAliasSpec {
        value: BillingCycle::Quarterly,
        aliases: &["quarterly", "quarter", "每季", "季"],
    },
    ValueAliasSpec {
        value: BillingCycle::Yearly,
        aliases: &["yearly", "annual", "annually", "year", "每年", "年", "年付"],
    },
];

pub(crate) fn trim_cell(text: &str) -> String {
    text.trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_string()
}

fn normalize_key(key: &str) -> String {
    trim_cell(key).to_lowercase()
}

fn strict_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("invalid date regex"))
}

fn lookup_value<V: Copy>(specs: &[ValueAliasSpec<V>], raw: &str) -> Option<V> {
    let exact = raw.trim();
    if let Some(spec) = specs.iter().find(|s| s.aliases.contains(&exact)) {
        return Some(spec.value);
    }
    let lowered = exact.to_lowercase();
    specs
        .iter()
        .find(|s| s.aliases.contains(&lowered.as_str()))
        .map(|s| s.value)
}

fn parse_price(raw: &str) -> Result<f64, String> {
    let cleaned = raw
        .trim()
        .replace(',', "")
        .replace("NT$", "")
        .replace('$', "")
        .replace('￥', "")
        .replace('¥', "")
        .replace('元', "")
        .replace(' ', "");
    if cleaned.is_empty() {
        return Err(format!("invalid amount format '{raw}'"));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid amount format '{raw}'"))
}

fn parse_ymd_parts(text: &str) -> Option<(i32, u32, u32)> {
    let parts = text.split('-').collect::<Vec<_>>();
    if parts.len() != 3 {
        return None;
    }
    let year = parts[0].parse::<i32>().ok()?;
    let month = parts[1].parse::<u32>().ok()?;
    let day = parts[2].parse::<u32>().ok()?;
    Some((year, month, day))
}

fn normalize_date_value(raw: &str) -> Result<String, String> {
    let text = trim_cell(raw);
    if strict_date_re().is_match(&text) {
        return Ok(text);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Ok(dt.with_timezone(&Utc).format("%Y-%m-%d").to_string());
    }

    let dashed = text.replace('/', "-").replace('.', "-");
    let first_token = dashed
        .split([' ', 'T'])
        .next()
        .map(trim_cell)
        .unwrap_or_default();
    if let Some((year, month, day)) = parse_ymd_parts(&first_token) {
        if NaiveDate::from_ymd_opt(year, month, day).is_some() {
            return Ok(format!("{year:04}-{month:02}-{day:02}"));
        }
    }

    // Spreadsheet cells often surface dates as serial day counts.
    if let Ok(serial) = text.parse::<f64>() {
        if serial.is_finite() && serial > 0.0 {
            if let Some(date) = NaiveDate::from_ymd_opt(1899, 12, 30)
                .and_then(|base| base.checked_add_signed(Duration::days(serial.floor() as i64)))
            {
                return Ok(date.format("%Y-%m-%d").to_string());
            }
        }
    }

    Err(format!("invalid date format '{raw}'"))
}

#[derive(Debug, Default)]
struct RowDraft {
    name: Option<String>,
    category: Option<SubscriptionCategory>,
    price: Option<f64>,
    currency: Option<String>,
    billing_cycle: Option<BillingCycle>,
    start_date: Option<String>,
    next_billing_date: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub subscription: Option<SubscriptionRecord>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RowNormalizer {
    fields: &'static [FieldAliasSpec],
    categories: &'static [ValueAliasSpec<SubscriptionCategory>],
    cycles: &'static [ValueAliasSpec<BillingCycle>],
    base_currency: String,
    default_icon: String,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RowNormalizer {
    pub fn new() -> Self {
        Self {
            fields: FIELD_ALIAS_SPECS,
            categories: CATEGORY_ALIAS_SPECS,
            cycles: CYCLE_ALIAS_SPECS,
            base_currency: DEFAULT_CURRENCY.to_string(),
            default_icon: DEFAULT_ICON.to_string(),
        }
    }

    pub fn with_base_currency(mut self, code: &str) -> Self {
        self.base_currency = code.trim().to_uppercase();
        self
    }

    fn resolve_field(&self, raw_key: &str) -> Option<FieldKey> {
        let key = normalize_key(raw_key);
        if key.is_empty() {
            return None;
        }
        self.fields
            .iter()
            .find(|spec| spec.aliases.contains(&key.as_str()))
            .map(|spec| spec.field)
    }

    /// Normalize one raw row. `index` is the 0-based data-row position; all
    /// diagnostics reference the 1-based position derived from it. A row is
    /// rejected only when no name field survives; every other anomaly is a
    /// non-fatal diagnostic.
    pub fn normalize(&self, row: &RawRow, index: usize) -> NormalizedRow {
        let row_no = index + 1;
        let mut draft = RowDraft::default();
        let mut diagnostics: Vec<String> = Vec::new();

        for (raw_key, raw_value) in row {
            let Some(field) = self.resolve_field(raw_key) else {
                continue;
            };
            let value = trim_cell(raw_value);
            if value.is_empty() {
                continue;
            }
            match field {
                FieldKey::Name => draft.name = Some(value),
                FieldKey::Category => {
                    draft.category = Some(
                        lookup_value(self.categories, &value)
                            .unwrap_or(SubscriptionCategory::Other),
                    );
                }
                FieldKey::Price => match parse_price(&value) {
                    Ok(price) => draft.price = Some(price),
                    Err(err) => diagnostics.push(format!("row {row_no}: {err}")),
                },
                FieldKey::Currency => draft.currency = Some(value.to_uppercase()),
                FieldKey::BillingCycle => {
                    draft.billing_cycle =
                        Some(lookup_value(self.cycles, &value).unwrap_or(BillingCycle::Monthly));
                }
                FieldKey::StartDate => match normalize_date_value(&value) {
                    Ok(date) => draft.start_date = Some(date),
                    Err(err) => diagnostics.push(format!("row {row_no}: {err}")),
                },
                FieldKey::NextBillingDate => match normalize_date_value(&value) {
                    Ok(date) => draft.next_billing_date = Some(date),
                    Err(err) => diagnostics.push(format!("row {row_no}: {err}")),
                },
                FieldKey::Icon => draft.icon = Some(value),
            }
        }

        let Some(name) = draft.name else {
            diagnostics.push(format!("row {row_no}: missing name field"));
            return NormalizedRow {
                subscription: None,
                error: Some(diagnostics.join("; ")),
            };
        };

        let start_date = draft
            .start_date
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
        let next_billing_date = draft
            .next_billing_date
            .unwrap_or_else(|| start_date.clone());

        let subscription = SubscriptionRecord {
            id: subscription_id_from_name(&name),
            name,
            category: draft.category.unwrap_or(SubscriptionCategory::Other),
            price: draft.price.unwrap_or(0.0),
            currency: draft
                .currency
                .unwrap_or_else(|| self.base_currency.clone()),
            billing_cycle: draft.billing_cycle.unwrap_or(BillingCycle::Monthly),
            start_date,
            next_billing_date,
            icon: draft.icon.unwrap_or_else(|| self.default_icon.clone()),
            reminder_enabled: false,
        };
        let error = if diagnostics.is_empty() {
            None
        } else {
            Some(diagnostics.join("; "))
        };
        NormalizedRow {
            subscription: Some(subscription),
            error,
        }
    }
}
