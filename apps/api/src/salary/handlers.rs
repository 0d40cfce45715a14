use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};

use crate::salary::{parse, SalaryRuleKind};

#[derive(Debug, Deserialize)]
pub struct NormalizeParams {
    pub raw: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub raw: Option<String>,
    pub annual_salary: u64,
    pub rule: Option<SalaryRuleKind>,
}

/// GET /api/v1/salary/normalize?raw=...
pub async fn handle_normalize(Query(params): Query<NormalizeParams>) -> Json<NormalizeResponse> {
    let parsed = parse(params.raw.as_deref());
    Json(NormalizeResponse {
        raw: params.raw,
        annual_salary: parsed.annual,
        rule: parsed.rule,
    })
}
