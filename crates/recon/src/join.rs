use std::collections::BTreeMap;

use crate::error::ReconError;

/// Outcome of a full outer join for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum Joined<L, R> {
    Both(L, R),
    LeftOnly(L),
    RightOnly(R),
}

impl<L, R> Joined<L, R> {
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Both(..) => "both",
            Self::LeftOnly(_) => "left_only",
            Self::RightOnly(_) => "right_only",
        }
    }
}

fn index_unique<T>(
    side: &'static str,
    items: Vec<T>,
    key: impl Fn(&T) -> &str,
) -> Result<BTreeMap<String, T>, ReconError> {
    let mut map = BTreeMap::new();
    let mut repeats: BTreeMap<String, usize> = BTreeMap::new();
    for item in items {
        let k = key(&item).to_string();
        if map.contains_key(&k) {
            *repeats.entry(k).or_insert(1) += 1;
        } else {
            map.insert(k, item);
        }
    }
    // Report the smallest repeated key with its full occurrence count.
    if let Some((identifier, count)) = repeats.into_iter().next() {
        return Err(ReconError::DuplicateKey {
            side,
            identifier,
            count,
        });
    }
    Ok(map)
}

/// Full outer join of two keyed sets by exact key equality.
///
/// Keys must be unique on each side. Output is ordered by key, one entry per
/// key in the union of both sides.
pub fn outer_join<L, R>(
    left: Vec<L>,
    right: Vec<R>,
    left_key: impl Fn(&L) -> &str,
    right_key: impl Fn(&R) -> &str,
) -> Result<Vec<(String, Joined<L, R>)>, ReconError> {
    let left_map = index_unique("left", left, left_key)?;
    let mut right_map = index_unique("right", right, right_key)?;

    let mut joined: BTreeMap<String, Joined<L, R>> = BTreeMap::new();
    for (key, l) in left_map {
        let outcome = match right_map.remove(&key) {
            Some(r) => Joined::Both(l, r),
            None => Joined::LeftOnly(l),
        };
        joined.insert(key, outcome);
    }
    for (key, r) in right_map {
        joined.insert(key, Joined::RightOnly(r));
    }

    Ok(joined.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_outcomes() {
        let left = vec![("10.1/a", 1), ("10.1/b", 2)];
        let right = vec![("10.1/b", "x"), ("10.1/c", "y")];
        let out = outer_join(left, right, |l| l.0, |r| r.0).unwrap();

        let keys: Vec<&str> = out.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["10.1/a", "10.1/b", "10.1/c"]);
        assert_eq!(out[0].1, Joined::LeftOnly(("10.1/a", 1)));
        assert_eq!(out[1].1, Joined::Both(("10.1/b", 2), ("10.1/b", "x")));
        assert_eq!(out[2].1, Joined::RightOnly(("10.1/c", "y")));
    }

    #[test]
    fn empty_sides() {
        let out = outer_join::<(&str, i32), (&str, i32)>(vec![], vec![], |l| l.0, |r| r.0).unwrap();
        assert!(out.is_empty());

        let out = outer_join(vec![("k", 1)], Vec::<(&str, i32)>::new(), |l| l.0, |r| r.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.outcome(), "left_only");
    }

    #[test]
    fn duplicate_key_rejected() {
        let left = vec![("k", 1), ("k", 2)];
        let err = outer_join(left, Vec::<(&str, i32)>::new(), |l| l.0, |r| r.0).unwrap_err();
        assert!(err.to_string().contains("left input has identifier 'k' 2 times"));
    }

    #[test]
    fn duplicate_key_reports_every_occurrence() {
        let right = vec![("z", 0), ("k", 1), ("k", 2), ("z", 3), ("k", 4)];
        let err = outer_join(Vec::<(&str, i32)>::new(), right, |l| l.0, |r| r.0).unwrap_err();
        assert!(matches!(
            err,
            ReconError::DuplicateKey { side: "right", ref identifier, count: 3 } if identifier == "k"
        ));
    }

    #[test]
    fn keys_are_byte_exact() {
        let out = outer_join(vec![("10.1/A", 1)], vec![("10.1/a", 2)], |l| l.0, |r| r.0).unwrap();
        assert_eq!(out.len(), 2);
    }
}
