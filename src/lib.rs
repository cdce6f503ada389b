mod chunked;
mod file_host;
mod row_normalize;
mod sheet_import;
mod subscription;

pub use chunked::{
    process_in_chunks, run_on_worker, DispatchStrategy, ImportProgress, NoProgress, CHUNK_SIZE,
};
pub use file_host::{
    pick_import_file, FileFilter, FileHost, NativeFileHost, IMPORT_FILE_FILTERS,
};
pub use row_normalize::{FieldKey, NormalizedRow, RawRow, RowNormalizer};
pub use sheet_import::{
    parse_csv, parse_csv_with, parse_excel, parse_excel_with, parse_import_file,
    parse_import_file_with, ImportResult, UNSUPPORTED_FORMAT_MESSAGE,
};
pub use subscription::{
    subscription_id_from_name, BillingCycle, SubscriptionCategory, SubscriptionRecord,
    DEFAULT_CURRENCY, DEFAULT_ICON,
};
