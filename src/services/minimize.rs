//! Greedy set-cover minimization of branch paths.
//!
//! A branching site is a `(kind, index-in-path)` pair; the minimizer picks
//! the smallest greedy subset of paths whose sites cover every site present
//! in the input.

use std::collections::HashSet;

/// Node kinds (and tokens) that count as branching sites.
const SITE_KINDS: [&str; 9] = [
    "if_statement",
    "for_statement",
    "while_statement",
    "switch_expression",
    "switch_statement",
    "try_statement",
    "catch_clause",
    "except_clause",
    "finally",
];

fn is_site_kind(token: &str) -> bool {
    // Condition-arm tokens are sites too: a then-path and an else-path share
    // their if_statement position, and only the arm marker tells them apart.
    SITE_KINDS.contains(&token) || token.ends_with("-then") || token.ends_with("-else")
}

type Site = (String, usize);

fn sites_of(path: &[String]) -> impl Iterator<Item = Site> + '_ {
    path.iter()
        .enumerate()
        .filter(|(_, token)| is_site_kind(token))
        .map(|(index, token)| (token.clone(), index))
}

/// Select a minimal covering subset of `paths`.
///
/// Greedy: repeatedly take the unused path covering the most not-yet-covered
/// sites (earliest wins ties), until every site is covered or no path adds
/// anything new. Deterministic for a deterministic input order; every
/// selected path contributed at least one new site when it was chosen.
pub fn minimize_paths(paths: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut all_sites: HashSet<Site> = HashSet::new();
    for path in paths {
        all_sites.extend(sites_of(path));
    }

    let mut covered: HashSet<Site> = HashSet::new();
    let mut used = vec![false; paths.len()];
    let mut result = Vec::new();

    while covered.len() < all_sites.len() {
        let mut best: Option<(usize, HashSet<Site>)> = None;

        for (i, path) in paths.iter().enumerate() {
            if used[i] {
                continue;
            }
            let new_sites: HashSet<Site> = sites_of(path)
                .filter(|site| !covered.contains(site))
                .collect();

            let better = match &best {
                Some((_, current)) => new_sites.len() > current.len(),
                None => !new_sites.is_empty(),
            };
            if better {
                best = Some((i, new_sites));
            }
        }

        let Some((index, new_sites)) = best else { break };
        used[index] = true;
        result.push(paths[index].clone());
        covered.extend(new_sites);
    }

    result
}
