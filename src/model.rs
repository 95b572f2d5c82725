/// 正規化済み公報レコードの定義。
use serde::Serialize;

use crate::classify::PublicationType;

/// 欠損フィールドの既定値。null伝播は行わない。
pub(crate) const UNKNOWN: &str = "Unknown";
pub(crate) const UNKNOWN_CLASS: &str = "Unknown class";

/// 上流検索ヒットから構築した公報レコード。構築後は不変。
///
/// Webhookへ送信するJSONボディそのものであり、フィールド名は
/// 下流が期待するcamelCase形式にシリアライズされる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub case_number: String,
    pub publication_type: PublicationType,
    pub court_body: String,
    pub publication_date: String,
    pub instance_level: String,
    pub case_class: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publication_serializes_with_camel_case_keys() {
        let publication = Publication {
            case_number: "0001234-56.2025.8.05.0001".to_string(),
            publication_type: PublicationType::Intimation,
            court_body: "2ª Vara Cível".to_string(),
            publication_date: "2025-03-10".to_string(),
            instance_level: "G1".to_string(),
            case_class: "Procedimento Comum".to_string(),
        };

        let value = serde_json::to_value(&publication).expect("serializes");

        assert_eq!(value["caseNumber"], "0001234-56.2025.8.05.0001");
        assert_eq!(value["publicationType"], "Intimation");
        assert_eq!(value["courtBody"], "2ª Vara Cível");
        assert_eq!(value["publicationDate"], "2025-03-10");
        assert_eq!(value["instanceLevel"], "G1");
        assert_eq!(value["caseClass"], "Procedimento Comum");
    }
}
