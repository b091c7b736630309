//! 批量处理
//!
//! 文档之间相互独立，由 rayon 线程池并行处理。共享的只有汇总计数和日志，
//! 它们放在 [`BatchContext`] 中，各自由互斥锁保护。

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use crate::config::WalkConfig;
use crate::core::DocumentProcessor;
use crate::error::{Context, RetrofitError, RetrofitResult};
use crate::report::{Aggregator, DocumentReport, ReviewLog};

type SharedWriter = Box<dyn Write + Send>;

/// 批次共享的状态
pub struct BatchContext {
    aggregator: Mutex<Aggregator>,
    review_log: Mutex<ReviewLog<SharedWriter>>,
    change_log: Option<Mutex<SharedWriter>>,
}

impl BatchContext {
    pub fn new(review_log: SharedWriter, change_log: Option<SharedWriter>) -> Self {
        BatchContext {
            aggregator: Mutex::new(Aggregator::new()),
            review_log: Mutex::new(ReviewLog::new(review_log)),
            change_log: change_log.map(Mutex::new),
        }
    }

    /// 以追加方式打开日志文件
    pub fn open(review_log: &Path, change_log: Option<&Path>) -> RetrofitResult<Self> {
        let review: SharedWriter = Box::new(BufWriter::new(append(review_log)?));
        let changes = match change_log {
            Some(path) => Some(Box::new(BufWriter::new(append(path)?)) as SharedWriter),
            None => None,
        };
        Ok(Self::new(review, changes))
    }

    /// 记录一份文档的结果
    pub fn record(&self, report: &DocumentReport) {
        let entries = self
            .aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(report);

        if !entries.is_empty() {
            let mut log = self.review_log.lock().unwrap_or_else(PoisonError::into_inner);
            for entry in &entries {
                if let Err(err) = log.append(entry) {
                    warn!(file = report.file.as_str(), "review log write failed: {}", err);
                }
            }
        }

        if report.persisted {
            if let Some(change_log) = &self.change_log {
                let mut writer = change_log.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(err) = writeln!(writer, "{}", report.file) {
                    warn!(file = report.file.as_str(), "change log write failed: {}", err);
                }
            }
        }
    }

    /// 写出去重后的异常并刷新日志，返回汇总
    pub fn finish(self) -> RetrofitResult<Aggregator> {
        let aggregator = self.aggregator.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut log = self.review_log.into_inner().unwrap_or_else(PoisonError::into_inner);
        for entry in aggregator.anomaly_entries() {
            log.append(&entry)?;
        }
        log.flush()?;
        if let Some(change_log) = self.change_log {
            change_log
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .flush()
                .context("Change log", "flush")?;
        }
        Ok(aggregator)
    }
}

fn append(path: &Path) -> RetrofitResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Log file", path.display())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

fn walk(dir: &Path, walk_config: &WalkConfig, found: &mut Vec<PathBuf>) -> RetrofitResult<()> {
    for entry in fs::read_dir(dir).context("Directory", dir.display())? {
        let path = entry?.path();
        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| walk_config.skip_dirs.iter().any(|s| s == n));
            if skipped {
                debug!(dir = %path.display(), "skipping directory");
                continue;
            }
            walk(&path, walk_config, found)?;
        } else if has_extension(&path, &walk_config.extensions) {
            found.push(path);
        }
    }
    Ok(())
}

/// 展开命令行给出的路径：目录递归遍历，文件原样保留
pub fn collect_files(paths: &[PathBuf], walk_config: &WalkConfig) -> RetrofitResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, walk_config, &mut found)?;
        } else if path.is_file() {
            found.push(path.clone());
        } else {
            return Err(RetrofitError::from(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file or directory",
            ))
            .with_context("Path", path.display()));
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

/// 处理并（非试运行时）写回一个文件
pub fn process_file(processor: &DocumentProcessor, path: &Path, dry_run: bool) -> DocumentReport {
    let file = path.display().to_string();
    let input = match fs::read(path) {
        Ok(input) => input,
        Err(err) => {
            let mut report = DocumentReport::new(&file);
            report.error = Some(RetrofitError::from(err).with_context("File name", &file));
            return report;
        }
    };

    let outcome = processor.process_document(&file, &input);
    let mut report = outcome.report;
    if let Some(output) = outcome.output {
        if dry_run {
            debug!(file = file.as_str(), "dry run, not writing");
        } else {
            match fs::write(path, output) {
                Ok(()) => report.persisted = true,
                Err(err) => report.error = Some(RetrofitError::from(err).with_context("File name", &file)),
            }
        }
    }
    report
}

/// 并行处理一组文件；`jobs` 为 `None` 时使用 rayon 默认线程数
pub fn run_batch(
    processor: &DocumentProcessor,
    files: &[PathBuf],
    context: &BatchContext,
    dry_run: bool,
    jobs: Option<usize>,
) -> RetrofitResult<()> {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder
        .build()
        .map_err(|e| RetrofitError::config(format!("unable to start worker pool: {}", e)))?;

    info!(files = files.len(), dry_run, "starting batch");
    pool.install(|| {
        files.par_iter().for_each(|path| {
            let report = process_file(processor, path, dry_run);
            context.record(&report);
        })
    });
    Ok(())
}

/// 读取变更日志中的文件列表
pub fn read_change_log(path: &Path) -> RetrofitResult<Vec<PathBuf>> {
    let file = File::open(path).context("Change log", path.display())?;
    let mut files = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            files.push(PathBuf::from(line));
        }
    }
    Ok(files)
}

/// 用原始目录中的文件覆盖工作目录中的同名文件，返回恢复的文件数
pub fn reset(from: &Path, to: &Path, files: &[PathBuf]) -> RetrofitResult<usize> {
    let mut restored = 0;
    for file in files {
        let relative = file.strip_prefix(to).unwrap_or(file);
        if relative.is_absolute() {
            return Err(RetrofitError::precondition("file lies outside the working tree")
                .with_context("File name", file.display()));
        }
        let source = from.join(relative);
        let target = to.join(relative);
        fs::copy(&source, &target).context("File name", source.display())?;
        debug!(file = %target.display(), "restored");
        restored += 1;
    }
    info!(restored, "reset complete");
    Ok(restored)
}
