use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug)]
pub struct Scenario(pub Vec<Command>);

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the node with the given identifier
    Start {
        id: String,
    },

    /// Write a transaction line to the node's standard input
    Submit {
        id: String,
        line: String,
    },

    /// Kill the node without letting it shut down
    Crash {
        id: String,
    },

    /// Sleep the harness for `ms` milliseconds
    Sleep {
        ms: u64,
    },
}

#[cfg(test)]
mod tests {

    use super::{Command, Scenario};

    #[test]
    fn test_parse_scenario() {
        let text = r#"[
            { "type": "Start", "id": "node1" },
            { "type": "Submit", "id": "node1", "line": "DEPOSIT a 10" },
            { "type": "Sleep", "ms": 250 },
            { "type": "Crash", "id": "node1" }
        ]"#;
        let scenario: Scenario = serde_json::from_str(text).unwrap();
        assert_eq!(scenario.0, vec![
            Command::Start { id: "node1".to_string() },
            Command::Submit { id: "node1".to_string(), line: "DEPOSIT a 10".to_string() },
            Command::Sleep { ms: 250 },
            Command::Crash { id: "node1".to_string() },
        ]);
    }

    #[test]
    fn test_bundled_scenarios_parse() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let text = std::fs::read_to_string(&path).unwrap();
            let scenario: Scenario = serde_json::from_str(&text).unwrap();
            assert!(!scenario.0.is_empty(), "{:?} is empty", path);
        }
    }
}
