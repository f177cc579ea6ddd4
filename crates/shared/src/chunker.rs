/// Merge an ordered sequence of text fragments into size-bounded chunks.
///
/// Each fragment is appended to the current chunk unless that would push it
/// past `max_size` while at least `min_size` bytes of input remain from the
/// current fragment onward. The remainder check lets a short tail merge past
/// the bound instead of becoming an undersized trailing chunk. Empty
/// fragments are skipped; order is preserved; concatenating the output
/// reproduces the concatenation of all non-empty inputs.
pub fn join_parts<I>(parts: I, max_size: usize, min_size: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let parts: Vec<String> = parts.into_iter().collect();
    let mut remaining: usize = parts.iter().map(String::len).sum();

    let mut result = Vec::new();
    let mut current = String::new();
    for part in parts {
        let from_here = remaining;
        remaining -= part.len();
        if part.is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + part.len() > max_size && from_here >= min_size {
            result.push(current);
            current = part;
        } else {
            current.push_str(&part);
        }
    }
    result.push(current);
    result
}
