//! Ordered unique-identifier lists.
//!
//! A [`UidList`] stores the chronological order of the identifiers added to
//! it. Order is significant (it encodes display order), so the list is never
//! sorted; new items go to one of the two ends and removals shift the
//! remainder left. Every operation assumes the list is duplicate-free on
//! entry and guarantees it stays duplicate-free on exit.
//!
//! On the wire and in storage a list is a plain JSON array of non-negative
//! integers. An absent or `null` column is the empty list; an array with
//! repeated elements is rejected at deserialization time.

use serde::{Deserialize, Serialize};

use crate::Uid;

/// Errors reported by [`UidList`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UidListError {
    /// The identifier is already present in the list.
    #[error("duplicate uid: {0}")]
    Duplicate(Uid),

    /// The identifier is not present in the list.
    #[error("uid is not found: {0}")]
    NotFound(Uid),

    /// The item is already at the edge the move targets.
    #[error("edge position")]
    EdgePosition,

    /// The input contains repeated identifiers.
    #[error("items are not unique")]
    NotUnique,
}

/// An ordered, duplicate-free list of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct UidList(Vec<Uid>);

impl UidList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a list from raw identifiers, rejecting duplicates.
    pub fn from_vec(uids: Vec<Uid>) -> Result<Self, UidListError> {
        let list = Self(uids);
        if !list.is_unique() {
            return Err(UidListError::NotUnique);
        }
        Ok(list)
    }

    fn is_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.0.len());
        self.0.iter().all(|uid| seen.insert(*uid))
    }

    /// Number of items in the list.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `uid` is contained in the list.
    pub fn contains(&self, uid: Uid) -> bool {
        self.0.contains(&uid)
    }

    /// The items in list order.
    pub fn as_slice(&self) -> &[Uid] {
        &self.0
    }

    /// Iterates over the items in list order.
    pub fn iter(&self) -> impl Iterator<Item = Uid> + '_ {
        self.0.iter().copied()
    }

    /// The last item, if any.
    pub fn last(&self) -> Option<Uid> {
        self.0.last().copied()
    }

    /// Adds `uid` to the top (index 0) or the bottom of the list.
    pub fn add(&mut self, uid: Uid, at_top: bool) -> Result<(), UidListError> {
        if self.contains(uid) {
            return Err(UidListError::Duplicate(uid));
        }
        if at_top {
            self.0.insert(0, uid);
        } else {
            self.0.push(uid);
        }
        Ok(())
    }

    /// Removes `uid`, shifting subsequent items left.
    pub fn remove(&mut self, uid: Uid) -> Result<(), UidListError> {
        let pos = self.position(uid)?;
        self.0.remove(pos);
        Ok(())
    }

    /// 0-based position of `uid`.
    pub fn position(&self, uid: Uid) -> Result<usize, UidListError> {
        self.0
            .iter()
            .position(|x| *x == uid)
            .ok_or(UidListError::NotFound(uid))
    }

    /// Swaps `uid` with its predecessor.
    pub fn move_up(&mut self, uid: Uid) -> Result<(), UidListError> {
        let pos = self.position(uid)?;
        if pos == 0 {
            return Err(UidListError::EdgePosition);
        }
        self.0.swap(pos - 1, pos);
        Ok(())
    }

    /// Swaps `uid` with its successor.
    pub fn move_down(&mut self, uid: Uid) -> Result<(), UidListError> {
        let pos = self.position(uid)?;
        if pos == self.0.len() - 1 {
            return Err(UidListError::EdgePosition);
        }
        self.0.swap(pos, pos + 1);
        Ok(())
    }

    /// Moves `uid` to the top, preserving the relative order of the rest.
    ///
    /// Returns `true` without mutating when the item is already on top.
    pub fn raise(&mut self, uid: Uid) -> Result<bool, UidListError> {
        let pos = self.position(uid)?;
        if pos == 0 {
            return Ok(true);
        }
        let item = self.0.remove(pos);
        self.0.insert(0, item);
        Ok(false)
    }

    /// The 1-based page `page` of size `page_size`, clipped to the list's
    /// bounds. A page starting beyond the end (and a zero page or page size)
    /// is empty.
    pub fn page(&self, page: usize, page_size: usize) -> &[Uid] {
        if page == 0 || page_size == 0 {
            return &[];
        }
        let start = (page - 1).saturating_mul(page_size);
        if start >= self.0.len() {
            return &[];
        }
        let end = start.saturating_add(page_size).min(self.0.len());
        &self.0[start..end]
    }
}

/// Serde helper for nullable children columns: both `null` and an absent
/// field deserialize to the empty list. Use with `#[serde(default,
/// deserialize_with = "uid_list::nullable")]`.
pub fn nullable<'de, D>(deserializer: D) -> Result<UidList, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let list = Option::<UidList>::deserialize(deserializer)?;
    Ok(list.unwrap_or_default())
}

impl TryFrom<Vec<u64>> for UidList {
    type Error = UidListError;

    fn try_from(uids: Vec<u64>) -> Result<Self, Self::Error> {
        Self::from_vec(uids)
    }
}

impl From<UidList> for Vec<u64> {
    fn from(list: UidList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a UidList {
    type Item = Uid;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Uid>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(uids: &[Uid]) -> UidList {
        UidList::from_vec(uids.to_vec()).unwrap()
    }

    #[test]
    fn add_and_order() {
        let mut l = UidList::new();
        l.add(1, false).unwrap();
        l.add(2, false).unwrap();
        l.add(3, true).unwrap();
        assert_eq!(l.as_slice(), &[3, 1, 2]);
    }

    #[test]
    fn duplicate_add_fails_and_leaves_list_unchanged() {
        let mut l = list(&[1, 2, 3]);
        assert_eq!(l.add(2, false), Err(UidListError::Duplicate(2)));
        assert_eq!(l.add(2, true), Err(UidListError::Duplicate(2)));
        assert_eq!(l.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn remove_shifts_left() {
        let mut l = list(&[1, 2, 3, 4]);
        l.remove(2).unwrap();
        assert_eq!(l.as_slice(), &[1, 3, 4]);
        assert_eq!(l.remove(2), Err(UidListError::NotFound(2)));
    }

    #[test]
    fn move_up_and_down() {
        let mut l = list(&[1, 2, 3]);
        l.move_up(2).unwrap();
        assert_eq!(l.as_slice(), &[2, 1, 3]);
        l.move_down(2).unwrap();
        assert_eq!(l.as_slice(), &[1, 2, 3]);
        assert_eq!(l.move_up(1), Err(UidListError::EdgePosition));
        assert_eq!(l.move_down(3), Err(UidListError::EdgePosition));
        assert_eq!(l.move_up(9), Err(UidListError::NotFound(9)));
    }

    #[test]
    fn raise_preserves_relative_order() {
        let mut l = list(&[1, 2, 3, 4]);
        assert_eq!(l.raise(3), Ok(false));
        assert_eq!(l.as_slice(), &[3, 1, 2, 4]);
        assert_eq!(l.raise(3), Ok(true));
        assert_eq!(l.as_slice(), &[3, 1, 2, 4]);
        assert_eq!(l.raise(9), Err(UidListError::NotFound(9)));
    }

    #[test]
    fn pages_partition_the_list() {
        let l = list(&[10, 20, 30, 40, 50]);
        assert_eq!(l.page(1, 2), &[10, 20]);
        assert_eq!(l.page(2, 2), &[30, 40]);
        assert_eq!(l.page(3, 2), &[50]);
        assert!(l.page(4, 2).is_empty());
        assert!(l.page(0, 2).is_empty());
        assert!(l.page(1, 0).is_empty());
    }

    #[test]
    fn json_round_trip() {
        let l = list(&[5, 3, 8]);
        let json = serde_json::to_string(&l).unwrap();
        assert_eq!(json, "[5,3,8]");
        let back: UidList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, l);

        let empty: UidList = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn json_rejects_duplicates_and_non_integers() {
        assert!(serde_json::from_str::<UidList>("[1,2,1]").is_err());
        assert!(serde_json::from_str::<UidList>("[1,\"x\"]").is_err());
        assert!(serde_json::from_str::<UidList>("[1.5]").is_err());
    }

    #[test]
    fn nullable_column_is_empty() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "super::nullable")]
            children: UidList,
        }

        let row: Row = serde_json::from_str(r#"{"children":null}"#).unwrap();
        assert!(row.children.is_empty());
        let row: Row = serde_json::from_str("{}").unwrap();
        assert!(row.children.is_empty());
        let row: Row = serde_json::from_str(r#"{"children":[7]}"#).unwrap();
        assert_eq!(row.children.as_slice(), &[7]);
    }

    #[test]
    fn from_vec_rejects_duplicates() {
        assert_eq!(
            UidList::from_vec(vec![1, 1]),
            Err(UidListError::NotUnique)
        );
    }
}
