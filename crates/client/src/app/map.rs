use futuretd_engine::{
    CommandSender, InputPoller, KeyCode, MouseButton, RectF, RenderTarget, Rgba, Simulation,
    TickControl, Vec2,
};
use tracing::{debug, info, warn};

use super::server_command::{ServerCommand, TowerType};

pub(crate) const TILE_SIZE: f32 = 60.0;
pub(crate) const GRID_COLUMNS: u32 = 32;
pub(crate) const GRID_ROWS: u32 = 18;

const GRID_LINE_WIDTH: f32 = 1.0;
const TOWER_INSET: f32 = 10.0;
const GROUND_COLOR: Rgba = [92, 140, 70, 255];
const GRID_LINE_COLOR: Rgba = [70, 110, 52, 255];
const HOVER_COLOR: Rgba = [250, 215, 90, 255];
const TOWER_SELECT_KEYS: [KeyCode; 3] = [KeyCode::DIGIT_1, KeyCode::DIGIT_2, KeyCode::DIGIT_3];
const GRID_TOGGLE_KEY: KeyCode = KeyCode::G;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TilePos {
    pub(crate) x: u32,
    pub(crate) y: u32,
}

impl TilePos {
    fn from_signed(x: i32, y: i32) -> Option<TilePos> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        (x < GRID_COLUMNS && y < GRID_ROWS).then_some(TilePos { x, y })
    }

    fn index(self) -> usize {
        (self.y * GRID_COLUMNS + self.x) as usize
    }

    fn rect(self) -> RectF {
        RectF::new(
            self.x as f32 * TILE_SIZE,
            self.y as f32 * TILE_SIZE,
            TILE_SIZE,
            TILE_SIZE,
        )
    }
}

pub(crate) fn tile_at(point: Vec2) -> Option<TilePos> {
    if point.x < 0.0 || point.y < 0.0 {
        return None;
    }
    TilePos::from_signed(
        (point.x / TILE_SIZE).floor() as i32,
        (point.y / TILE_SIZE).floor() as i32,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildRejection {
    OutOfBounds,
    Occupied,
}

/// Tile grid covering the 1920x1080 reference canvas.
pub(crate) struct TileMap {
    towers: Vec<Option<TowerType>>,
    hovered: Option<TilePos>,
    selected_tower: TowerType,
    show_grid: bool,
    build_requests: CommandSender<ServerCommand>,
}

impl TileMap {
    pub(crate) fn new(build_requests: CommandSender<ServerCommand>) -> Self {
        Self {
            towers: vec![None; (GRID_COLUMNS * GRID_ROWS) as usize],
            hovered: None,
            selected_tower: TowerType::Laser,
            show_grid: true,
            build_requests,
        }
    }

    pub(crate) fn tower_at(&self, pos: TilePos) -> Option<TowerType> {
        self.towers.get(pos.index()).copied().flatten()
    }

    fn build_tower(
        &mut self,
        tile_x: i32,
        tile_y: i32,
        tower: TowerType,
    ) -> Result<TilePos, BuildRejection> {
        let pos = TilePos::from_signed(tile_x, tile_y).ok_or(BuildRejection::OutOfBounds)?;
        let slot = &mut self.towers[pos.index()];
        if slot.is_some() {
            return Err(BuildRejection::Occupied);
        }
        *slot = Some(tower);
        Ok(pos)
    }

    fn select_tower_from_input(&mut self, input: &InputPoller) {
        for (key, tower) in TOWER_SELECT_KEYS.into_iter().zip(TowerType::ALL) {
            if input.is_down_once(key) && self.selected_tower != tower {
                self.selected_tower = tower;
                debug!(tower = ?tower, "tower_type_selected");
            }
        }
    }

    fn toggle_grid_from_input(&mut self, input: &mut InputPoller) {
        if input.is_down_once(GRID_TOGGLE_KEY) {
            self.show_grid = !self.show_grid;
            input.release_key(GRID_TOGGLE_KEY);
            debug!(show_grid = self.show_grid, "grid_toggled");
        }
    }

    fn request_build(&self, pos: TilePos) {
        let command = ServerCommand::BuildTower {
            tile_x: pos.x as i32,
            tile_y: pos.y as i32,
            tower_type_id: self.selected_tower.id(),
        };
        if let Err(error) = self.build_requests.send(command) {
            warn!(error = %error, "build_request_dropped");
        }
    }
}

impl Simulation for TileMap {
    type Command = ServerCommand;

    fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::BuildTower {
                tile_x,
                tile_y,
                tower_type_id,
            } => {
                let Some(tower) = TowerType::from_id(tower_type_id) else {
                    warn!(tower_type_id, "unknown_tower_type");
                    return;
                };
                match self.build_tower(tile_x, tile_y, tower) {
                    Ok(pos) => info!(x = pos.x, y = pos.y, tower = ?tower, "tower_built"),
                    Err(rejection) => {
                        warn!(tile_x, tile_y, rejection = ?rejection, "tower_build_rejected")
                    }
                }
            }
        }
    }

    fn update(&mut self, _delta_seconds: f64, input: &mut InputPoller) -> TickControl {
        self.hovered = input.cursor_position().and_then(tile_at);
        self.select_tower_from_input(input);
        self.toggle_grid_from_input(input);

        if input.mouse_down_once(MouseButton::Left) {
            if let Some(pos) = self.hovered {
                self.request_build(pos);
            }
        }

        TickControl::Continue
    }

    fn render(&mut self, target: &mut dyn RenderTarget) {
        let width = GRID_COLUMNS as f32 * TILE_SIZE;
        let height = GRID_ROWS as f32 * TILE_SIZE;
        target.fill_rect(RectF::new(0.0, 0.0, width, height), GROUND_COLOR);

        if self.show_grid {
            for column in 1..GRID_COLUMNS {
                let x = column as f32 * TILE_SIZE;
                target.fill_rect(RectF::new(x, 0.0, GRID_LINE_WIDTH, height), GRID_LINE_COLOR);
            }
            for row in 1..GRID_ROWS {
                let y = row as f32 * TILE_SIZE;
                target.fill_rect(RectF::new(0.0, y, width, GRID_LINE_WIDTH), GRID_LINE_COLOR);
            }
        }

        if let Some(pos) = self.hovered {
            target.fill_rect(pos.rect(), HOVER_COLOR);
        }

        let positions =
            (0..GRID_ROWS).flat_map(|y| (0..GRID_COLUMNS).map(move |x| TilePos { x, y }));
        for pos in positions {
            let Some(tower) = self.tower_at(pos) else {
                continue;
            };
            let tile = pos.rect();
            target.fill_rect(
                RectF::new(
                    tile.x + TOWER_INSET,
                    tile.y + TOWER_INSET,
                    tile.width - 2.0 * TOWER_INSET,
                    tile.height - 2.0 * TOWER_INSET,
                ),
                tower.color(),
            );
        }
    }
}
