use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::models::Post;

/// Pick one post uniformly at random among those whose URL is not in the
/// ledger. `None` means every candidate has already been processed.
pub fn pick_unused(posts: Vec<Post>, used: &HashSet<String>) -> Option<Post> {
    let unused: Vec<Post> = posts
        .into_iter()
        .filter(|post| !used.contains(&post.url))
        .collect();
    unused.choose(&mut rand::thread_rng()).cloned()
}

/// How many candidates are still eligible.
pub fn count_unused(posts: &[Post], used: &HashSet<String>) -> usize {
    posts.iter().filter(|post| !used.contains(&post.url)).count()
}
