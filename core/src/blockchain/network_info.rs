use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct NetworkInfo {
    pub network_name: String,
    pub network_prefix: String,
}
