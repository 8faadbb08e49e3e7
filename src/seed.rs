use futures::stream::{self, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::db::{DocumentStore, SectionRecord};
use crate::error::{SeedError, StoreError};
use crate::parser::classify::Category;
use crate::parser::sections::Section;

/// Counts returned after every section was written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub seeded: usize,
    pub universal: usize,
    pub situational: usize,
}

impl SeedReport {
    fn record(mut self, category: Category) -> Self {
        self.seeded += 1;
        match category {
            Category::Universal => self.universal += 1,
            Category::Situational => self.situational += 1,
        }
        self
    }
}

/// Console verb for a committed write.
pub const SEEDED: &str = "Seeded";
/// Console verb when writes go to a throwaway store.
pub const DRY_RUN: &str = "Would seed";

/// Write every section to `collection`, one at a time, in document order.
///
/// Stops at the first failed write; sections before it stay written.
pub async fn seed(
    store: &dyn DocumentStore,
    collection: &str,
    sections: &[Section],
) -> Result<SeedReport, SeedError> {
    seed_as(store, collection, sections, SEEDED).await
}

/// [`seed`], announcing each written section with `verb`.
pub async fn seed_as(
    store: &dyn DocumentStore,
    collection: &str,
    sections: &[Section],
    verb: &str,
) -> Result<SeedReport, SeedError> {
    let pb = ProgressBar::new(sections.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    let progress = &pb;

    let result = stream::iter(sections.iter().map(Ok::<_, SeedError>))
        .try_fold(SeedReport::default(), |report, section| async move {
            let id = section.id();
            let record = SectionRecord::from(section);

            // An empty id would address the collection itself.
            let written = if id.is_empty() {
                Err(StoreError::InvalidId(section.title.clone()))
            } else {
                store.set(collection, &id, &record).await
            };

            match written {
                Ok(()) => {
                    let line = success_line(verb, collection, &id, &record);
                    progress.suspend(|| println!("{}", line));
                    progress.inc(1);
                    Ok(report.record(record.category))
                }
                Err(source) => {
                    progress.suspend(|| eprintln!("Failed to seed section: \"{}\"", section.title));
                    error!(title = %section.title, id = %id, error = %source, "write failed");
                    Err(SeedError::StorageWrite {
                        title: section.title.clone(),
                        id,
                        source,
                    })
                }
            }
        })
        .await;

    pb.finish_and_clear();
    if let Ok(report) = &result {
        info!(
            collection,
            seeded = report.seeded,
            universal = report.universal,
            situational = report.situational,
            "seeding complete"
        );
    }
    result
}

fn success_line(verb: &str, collection: &str, id: &str, record: &SectionRecord) -> String {
    format!(
        "{} section: \"{}\" ({}/{}, {})",
        verb, record.title, collection, id, record.category
    )
}

// ── Tests ──
