use crate::mask::ExclusionMask;
use tracing::info_span;

/// One i-cluster record and its block of j-entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IEntry {
    ci: usize,
    shift: usize,
    cj_start: usize,
    cj_end: usize,
}

impl IEntry {
    /// Global i-cluster index.
    pub fn ci(&self) -> usize {
        self.ci
    }

    /// Index of the periodic shift vector used for this i-cluster.
    pub fn shift(&self) -> usize {
        self.shift
    }

    pub fn j_range(&self) -> std::ops::Range<usize> {
        self.cj_start..self.cj_end
    }

    pub fn num_j(&self) -> usize {
        self.cj_end - self.cj_start
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JEntry {
    /// Global j-cluster index.
    pub cj: usize,
    pub excl: ExclusionMask,
}

/// Append-only cluster-pair list.
///
/// i-records are added through [`PairList::open_i_entry`]; while the
/// returned [`OpenIEntry`] lives nothing else can touch the list, so every
/// record owns one contiguous block of j-entries.
#[derive(Clone, Debug, Default)]
pub struct PairList {
    ci: Vec<IEntry>,
    cj: Vec<JEntry>,
}

impl PairList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(num_i: usize, num_j: usize) -> Self {
        Self {
            ci: Vec::with_capacity(num_i),
            cj: Vec::with_capacity(num_j),
        }
    }

    /// Starts a new i-record for i-cluster `ci` with shift index `shift`.
    pub fn open_i_entry(&mut self, ci: usize, shift: usize) -> OpenIEntry<'_> {
        let start = self.cj.len();
        self.ci.push(IEntry {
            ci,
            shift,
            cj_start: start,
            cj_end: start,
        });
        OpenIEntry { list: self }
    }

    pub fn i_entries(&self) -> &[IEntry] {
        &self.ci
    }

    pub fn j_entries(&self) -> &[JEntry] {
        &self.cj
    }

    pub fn j_entries_of(&self, entry: &IEntry) -> &[JEntry] {
        &self.cj[entry.j_range()]
    }

    pub fn num_i_entries(&self) -> usize {
        self.ci.len()
    }

    pub fn num_j_entries(&self) -> usize {
        self.cj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ci.is_empty()
    }

    pub fn clear(&mut self) {
        self.ci.clear();
        self.cj.clear();
    }

    /// Concatenates lists built independently, e.g. one per thread.
    pub fn combine(parts: impl IntoIterator<Item = PairList>) -> PairList {
        let parts: Vec<PairList> = parts.into_iter().collect();
        let _span = info_span!("PairList::combine", n_parts = parts.len()).entered();

        let num_i = parts.iter().map(|p| p.ci.len()).sum();
        let num_j = parts.iter().map(|p| p.cj.len()).sum();
        let mut out = PairList::with_capacity(num_i, num_j);

        for part in parts {
            let offset = out.cj.len();
            out.ci.extend(part.ci.into_iter().map(|e| IEntry {
                cj_start: e.cj_start + offset,
                cj_end: e.cj_end + offset,
                ..e
            }));
            out.cj.extend(part.cj);
        }
        out
    }
}

/// Cursor over the last i-record of a [`PairList`].
pub struct OpenIEntry<'a> {
    list: &'a mut PairList,
}

impl OpenIEntry<'_> {
    pub fn push(&mut self, entry: JEntry) {
        self.list.cj.push(entry);
    }

    /// Moves the record's end index to the current list size.
    pub fn mark_end(&mut self) {
        let end = self.list.cj.len();
        if let Some(last) = self.list.ci.last_mut() {
            last.cj_end = end;
        }
    }

    pub fn ci(&self) -> usize {
        self.current().ci
    }

    /// j-entries counted into the record so far.
    pub fn num_j(&self) -> usize {
        self.current().num_j()
    }

    /// Total j-entries in the underlying list.
    pub fn list_len(&self) -> usize {
        self.list.cj.len()
    }

    fn current(&self) -> &IEntry {
        // open_i_entry always pushes before handing out the cursor
        &self.list.ci[self.list.ci.len() - 1]
    }

    /// Closes the record. A record without j-entries is dropped; returns
    /// whether it was kept.
    pub fn close(mut self) -> bool {
        self.mark_end();
        if self.num_j() == 0 {
            self.list.ci.pop();
            false
        } else {
            true
        }
    }
}
