use tokio::sync::RwLock;

/// Anything stored in a [`MemoryTable`].
pub trait Record: Clone + Send + Sync {
    fn id(&self) -> i64;
}

macro_rules! impl_record {
    ($($ty:ty),*) => {
        $(impl Record for $ty {
            fn id(&self) -> i64 {
                self.id
            }
        })*
    };
}

impl_record!(
    crate::models::Course,
    crate::models::Assignment,
    crate::models::StudySession,
    crate::models::Student
);

/// Insertion-ordered in-memory collection backing the mock services.
///
/// Concurrent writers race; whichever write takes the lock last wins.
pub struct MemoryTable<T> {
    rows: RwLock<Vec<T>>,
}

impl<T: Record> MemoryTable<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn all(&self) -> Vec<T> {
        self.rows.read().await.clone()
    }

    pub async fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .iter()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    pub async fn find(&self, id: i64) -> Option<T> {
        self.rows.read().await.iter().find(|row| row.id() == id).cloned()
    }

    /// Inserts the row built for the next free id (`max + 1`, starting at 1).
    pub async fn insert_with<F>(&self, build: F) -> T
    where
        F: FnOnce(i64) -> T,
    {
        let mut rows = self.rows.write().await;
        let next_id = rows.iter().map(Record::id).max().unwrap_or(0) + 1;
        let row = build(next_id);
        rows.push(row.clone());
        row
    }

    pub async fn update<F>(&self, id: i64, change: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut rows = self.rows.write().await;
        let row = rows.iter_mut().find(|row| row.id() == id)?;
        change(row);
        Some(row.clone())
    }

    pub async fn remove(&self, id: i64) -> bool {
        let mut rows = self.rows.write().await;
        match rows.iter().position(|row| row.id() == id) {
            Some(index) => {
                rows.remove(index);
                true
            }
            None => false,
        }
    }
}
