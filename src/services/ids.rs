use uuid::Uuid;

/// New opaque widget id: a hyphenated UUID v4 (36 chars).
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}
