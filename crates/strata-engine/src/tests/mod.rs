mod helpers;
mod ingest;
mod lineage;
mod streaming;
