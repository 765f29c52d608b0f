use rand::Rng;

/// Length of a generated task identifier (hex characters)
pub const TASK_ID_LEN: usize = 8;

/// Generates a task identifier: 4 random bytes rendered as 8 lowercase hex characters.
///
/// Identifiers are not checked for collisions; uniqueness within a
/// workstream rests on the 32 bits of randomness alone.
pub fn generate_task_id() -> String {
    let mut bytes = [0u8; 4];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
