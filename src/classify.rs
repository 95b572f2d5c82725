/// 公報の移動記述（movimento）から種別を判定する純粋な分類器。
use serde::Serialize;

/// 公報の種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublicationType {
    Intimation,
    Order,
    Decision,
    Judgment,
    Other,
}

/// 移動記述を公報種別へ写像する。
///
/// 大文字小文字を無視した部分一致で、固定の優先順リストを上から評価する。
/// 記述が空または欠損の場合は常に `Other` を返し、決して失敗しない。
#[must_use]
pub fn classify(movement: Option<&str>) -> PublicationType {
    let Some(text) = movement else {
        return PublicationType::Other;
    };

    let lowered = text.to_lowercase();
    if lowered.contains("intima") {
        PublicationType::Intimation
    } else if lowered.contains("despacho") {
        PublicationType::Order
    } else if lowered.contains("decis") {
        PublicationType::Decision
    } else if lowered.contains("sentença") {
        PublicationType::Judgment
    } else {
        PublicationType::Other
    }
}
