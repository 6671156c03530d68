/*!
 * Extraction of translatable units.
 *
 * - `decomposer`: line classification and region/tag decomposition
 * - `position_map`: the persisted position map
 * - `mapping_file`: the human-readable placeholder mapping file
 * - `pools`: standard/duplicate pool routing and translation lookup
 * - `extractor`: the extraction run itself
 */

pub mod decomposer;
pub mod extractor;
pub mod mapping_file;
pub mod pools;
pub mod position_map;

pub use decomposer::{EMPTY_UNIT_SENTINEL, LineDecomposer, LineKind, LineLayout, LineShape};
pub use extractor::{CategoryCounts, ExtractionResult, ExtractionSummary, Extractor};
pub use mapping_file::MappingEntry;
pub use pools::{PoolSlot, TranslatedUnits, TranslationPools};
pub use position_map::PositionMap;
