//! Disk Manager - file-per-table page I/O.
//!
//! The [`DiskManager`] implements [`PageStore`] over a directory, with one
//! file per table. Page N of a table lives at file offset `N × PAGE_SIZE`.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageKey, Result};
use crate::storage::PageStore;

struct TableFile {
    file: File,
    page_count: u32,
}

/// File-backed [`PageStore`] managing one file per table under a root
/// directory.
///
/// # File Layout
/// Table `t` is stored in `<root>/<t>.tbl` as a dense array of pages:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┘
/// ```
///
/// # Thread Safety
/// All I/O is serialized by one internal mutex. The buffer pool calls in
/// from many threads but correctness, not I/O parallelism, is the goal here.
///
/// # Durability
/// Writes are followed by `fsync()`. Log-before-data ordering is the
/// transaction coordinator's responsibility, not the disk manager's.
pub struct DiskManager {
    root: PathBuf,
    tables: Mutex<HashMap<u32, TableFile>>,
}

impl DiskManager {
    /// Open a store rooted at `root`, creating the directory if needed.
    /// Table files are opened lazily on first access.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            tables: Mutex::new(HashMap::new()),
        })
    }

    fn table_path(&self, table_id: u32) -> PathBuf {
        self.root.join(format!("{}.tbl", table_id))
    }

    /// Run `f` with the (lazily opened) file of `table_id`.
    fn with_table<T>(&self, table_id: u32, f: impl FnOnce(&mut TableFile) -> Result<T>) -> Result<T> {
        let mut tables = self.tables.lock();
        if !tables.contains_key(&table_id) {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(self.table_path(table_id))?;
            let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;
            tables.insert(table_id, TableFile { file, page_count });
        }
        let table = tables.get_mut(&table_id).expect("table just inserted");
        f(table)
    }
}

impl PageStore for DiskManager {
    fn read_page(&self, key: PageKey) -> Result<Box<[u8; PAGE_SIZE]>> {
        self.with_table(key.table_id(), |table| {
            if key.page_no() >= table.page_count {
                return Err(Error::PageNotFound(key));
            }
            let offset = (key.page_no() as u64) * (PAGE_SIZE as u64);
            table.file.seek(SeekFrom::Start(offset))?;

            let mut data = Box::new([0u8; PAGE_SIZE]);
            table.file.read_exact(&mut data[..])?;
            Ok(data)
        })
    }

    fn write_page(&self, key: PageKey, data: &[u8; PAGE_SIZE]) -> Result<()> {
        self.with_table(key.table_id(), |table| {
            if key.page_no() >= table.page_count {
                return Err(Error::PageNotFound(key));
            }
            let offset = (key.page_no() as u64) * (PAGE_SIZE as u64);
            table.file.seek(SeekFrom::Start(offset))?;
            table.file.write_all(&data[..])?;
            table.file.sync_all()?;
            Ok(())
        })
    }

    fn num_pages(&self, table_id: u32) -> Result<u32> {
        self.with_table(table_id, |table| Ok(table.page_count))
    }

    fn allocate_page(&self, table_id: u32) -> Result<PageKey> {
        self.with_table(table_id, |table| {
            let key = PageKey::new(table_id, table.page_count);
            let offset = (key.page_no() as u64) * (PAGE_SIZE as u64);
            table.file.seek(SeekFrom::Start(offset))?;

            let zeros = [0u8; PAGE_SIZE];
            table.file.write_all(&zeros)?;
            table.file.sync_all()?;

            table.page_count += 1;
            Ok(key)
        })
    }
}
