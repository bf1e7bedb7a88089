use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterMeterRequest {
    pub serial: String,
    pub owner_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct MeterQuery {
    pub serial: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_first_page() {
        let q: MeterQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.serial, None);
        assert_eq!((q.limit, q.offset), (50, 0));
    }
}
