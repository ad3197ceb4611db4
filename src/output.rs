use crate::common::OutputOptions;

/// Receives the progress table of a solve.
///
/// `header` is called once before the first iteration with the column
/// names, `update` once per iteration, and `footer` once after the last
/// iteration. The first column is always the iteration number, passed
/// separately from the remaining `values`.
pub trait ProgressMonitor: Send + Sync {
    fn header(&self, options: &OutputOptions, columns: &[String]);

    fn update(&self, options: &OutputOptions, iteration: usize, values: &[f64]);

    fn footer(&self, options: &OutputOptions, columns: &[String]) {
        self.header(options, columns);
    }
}

/// Writes the progress table through the `log` facade at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMonitor;

impl ProgressMonitor for LogMonitor {
    fn header(&self, options: &OutputOptions, columns: &[String]) {
        log::info!("{}", format_header(options, columns));
    }

    fn update(&self, options: &OutputOptions, iteration: usize, values: &[f64]) {
        log::info!("{}", format_row(options, iteration, values));
    }
}

pub fn format_header(options: &OutputOptions, columns: &[String]) -> String {
    let w = options.width;
    columns
        .iter()
        .map(|c| format!("{:>w$}", c))
        .collect::<Vec<_>>()
        .join(&options.separator)
}

pub fn format_row(options: &OutputOptions, iteration: usize, values: &[f64]) -> String {
    let (w, p) = (options.width, options.precision);
    let mut cells = Vec::with_capacity(values.len() + 1);
    cells.push(format!("{:>w$}", iteration));
    for v in values {
        cells.push(if options.scientific {
            format!("{:>w$.p$e}", v)
        } else {
            format!("{:>w$.p$}", v)
        });
    }
    cells.join(&options.separator)
}

/// Collects column names and the values of the current row.
#[derive(Clone, Debug, Default)]
pub(crate) struct Outputter {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl Outputter {
    pub fn clear(&mut self) {
        self.columns.clear();
        self.values.clear();
    }

    pub fn add_entry(&mut self, name: &str) {
        self.columns.push(name.to_string());
    }

    /// Adds the columns `name[0]` to `name[n-1]`.
    pub fn add_entries(&mut self, name: &str, n: usize) {
        self.columns.extend((0..n).map(|i| format!("{}[{}]", name, i)));
    }

    pub fn add_value(&mut self, v: f64) {
        self.values.push(v);
    }

    pub fn add_values(&mut self, v: &[f64]) {
        self.values.extend_from_slice(v);
    }

    pub fn output_header(&self, monitor: &dyn ProgressMonitor, options: &OutputOptions) {
        monitor.header(options, &self.columns);
    }

    pub fn output_footer(&self, monitor: &dyn ProgressMonitor, options: &OutputOptions) {
        monitor.footer(options, &self.columns);
    }

    /// Sends the collected row and starts a new one.
    pub fn output_state(
        &mut self,
        monitor: &dyn ProgressMonitor,
        options: &OutputOptions,
        iteration: usize,
    ) {
        monitor.update(options, iteration, &self.values);
        self.values.clear();
    }
}
