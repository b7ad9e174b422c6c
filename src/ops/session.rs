use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

/// The default path relative inputs are joined onto.
///
/// Readers and the writer do not coordinate beyond the lock: a resolution that races a
/// `replace` sees either the old or the new value (last write wins).
#[derive(Debug, Default)]
pub(super) struct SessionDefaultPath {
    current: RwLock<Option<PathBuf>>,
}

impl SessionDefaultPath {
    pub(super) fn get(&self) -> Option<PathBuf> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(super) fn replace(&self, path: PathBuf) -> Option<PathBuf> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(path)
    }

    pub(super) fn clear(&self) -> Option<PathBuf> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_replaces_unconditionally() {
        let session = SessionDefaultPath::default();
        assert_eq!(session.get(), None);

        assert_eq!(session.replace(PathBuf::from("/a")), None);
        assert_eq!(
            session.replace(PathBuf::from("/b")),
            Some(PathBuf::from("/a"))
        );
        assert_eq!(session.get(), Some(PathBuf::from("/b")));

        assert_eq!(session.clear(), Some(PathBuf::from("/b")));
        assert_eq!(session.get(), None);
    }
}
