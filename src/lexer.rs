//! Splitting a raw input line into an argument vector.

/// Capacity of the argument vector, counting the slot conventionally
/// reserved for the terminating sentinel. A line therefore yields at most
/// `MAX_ARGS - 1` tokens; anything beyond that is silently dropped.
pub const MAX_ARGS: usize = 64;

/// Split a line into tokens on spaces and horizontal tabs.
///
/// There is no quoting: a quote character is an ordinary byte inside a
/// token. Empty and whitespace-only lines produce an empty vector. Tokens
/// are owned copies, so the caller is free to drop the original line.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for token in line.split([' ', '\t']) {
        if token.is_empty() {
            continue;
        }
        if tokens.len() == MAX_ARGS - 1 {
            break;
        }
        tokens.push(token.to_string());
    }
    tokens
}
