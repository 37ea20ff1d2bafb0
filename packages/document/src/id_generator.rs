use crate::NodeId;
use crc32fast::Hasher;

/// Generate a stable seed from a document or session name using CRC32
pub fn get_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for nodes created during a session
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String, // CRC32 of the session name
    count: u32,
}

impl IdGenerator {
    pub fn new(name: &str) -> Self {
        Self {
            seed: get_seed(name),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId::new(format!("{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Continue numbering after every id in `existing` minted from this seed
    pub fn skip_past<'a>(&mut self, existing: impl IntoIterator<Item = &'a NodeId>) {
        let prefix = format!("{}-", self.seed);
        for id in existing {
            let used = id
                .as_str()
                .strip_prefix(&prefix)
                .and_then(|count| count.parse::<u32>().ok());
            if let Some(used) = used {
                self.count = self.count.max(used);
            }
        }
    }
}
