use serde::Serialize;

#[derive(Debug, Default)]
pub struct LikeQuery {
    pub n: Option<String>,
}

impl LikeQuery {
    /// The first `n` wins when the parameter is repeated.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        LikeQuery {
            n: pairs.into_iter().find(|(k, _)| k == "n").map(|(_, v)| v),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct APIResponse {
    pub status: String,
}

impl APIResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        APIResponse {
            status: msg.to_owned(),
        }
    }
}
