use tower_lsp::lsp_types::{GotoDefinitionResponse, Location, Position, Range, Url};

use crate::ide::navigation::{IdeLocation, IdePosition, IdeRange};

pub fn lsp_position_to_ide(position: Position) -> IdePosition {
    IdePosition::new(position.line, position.character)
}

pub fn ide_position_to_lsp(position: IdePosition) -> Position {
    Position::new(position.line, position.character)
}

pub fn ide_range_to_lsp(range: IdeRange) -> Range {
    Range::new(ide_position_to_lsp(range.start), ide_position_to_lsp(range.end))
}

/// `None` when the target path cannot be expressed as a `file://` URI on this
/// platform (e.g. a relative path, or a drive-letter path on Unix).
pub fn ide_location_to_lsp(location: IdeLocation) -> Option<Location> {
    let uri = Url::from_file_path(&location.file_path).ok()?;
    Some(Location {
        uri,
        range: ide_range_to_lsp(location.range),
    })
}

pub fn ide_location_to_definition(location: IdeLocation) -> Option<GotoDefinitionResponse> {
    ide_location_to_lsp(location).map(GotoDefinitionResponse::Scalar)
}
