//! Session-level state: turn advancement, PDA surfacing, and snapshot
//! round-trips through JSON on disk.

use std::fs;

use bag_runtime::host::Hosts;
use bag_runtime::pda::{PDA_MODE_VAR, PDA_POSITION_VAR};
use bag_runtime::{BagRuntime, ObjectRecord};

#[test]
fn turn_worlds_fire_when_the_counter_crosses_the_gate() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 2);
    runtime
        .load_world(
            "EVT_WLD",
            "{\n\
             SET VAR ALARMED = 0;\n\
             IF (TURNCOUNT >= 3)\n\
               RUN EXPR = (ALARMED = 1);\n\
             ENDIF\n\
            }",
            false,
        )
        .expect("load event world");

    runtime.advance_turn();
    runtime.advance_turn();
    assert_eq!(runtime.vars.value("ALARMED"), Some("0"));
    assert_eq!(runtime.vars.turn_count(), 2);

    runtime.advance_turn();
    assert_eq!(runtime.vars.turn_count(), 3);
    assert_eq!(runtime.vars.value("ALARMED"), Some("1"));
}

#[test]
fn pda_commands_surface_and_scene_changes_drop_it() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 2);
    runtime
        .load_world(
            "BPDAMAP_WLD",
            "{ BKG = MAP.BMP; BMP MAPGRID = MAPGRID.BMP POS [0,0]; }",
            false,
        )
        .expect("load map display");
    runtime
        .load_world("HALL_WLD", "{ BKG = HALL.BMP; }", false)
        .expect("load hall");
    runtime
        .load_world(
            "BAR_WLD",
            "{ BKG = BAR.BMP; SET COMMAND PDAOPEN = SHOWPDA MAP; }",
            true,
        )
        .expect("load bar");

    runtime.run_object("BAR_WLD", "PDAOPEN").expect("open pda");
    assert_eq!(runtime.vars.value(PDA_MODE_VAR), Some("MAP"));
    assert_eq!(runtime.vars.value(PDA_POSITION_VAR), Some("UP"));
    let grid = runtime
        .manager
        .device("BPDAMAP_WLD")
        .and_then(|d| d.object("MAPGRID"))
        .expect("map grid");
    assert!(grid.is_attached());

    // Walking to another scene lowers the PDA.
    runtime.set_current_sdev("HALL_WLD").expect("scene change");
    assert_eq!(runtime.vars.value(PDA_MODE_VAR), Some("NONE"));
    assert_eq!(runtime.vars.value(PDA_POSITION_VAR), Some("DOWN"));
    let grid = runtime
        .manager
        .device("BPDAMAP_WLD")
        .and_then(|d| d.object("MAPGRID"))
        .expect("map grid");
    assert!(!grid.is_attached());
}

#[test]
fn snapshot_round_trips_through_a_json_file() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 2);
    runtime
        .load_world(
            "PLAYER_WLD",
            "{ BKG = P.BMP; HOLD BMP BOTTLE = BOTTLE.BMP POS [5,5]; }",
            false,
        )
        .expect("load player");
    runtime
        .load_world(
            "BAR_WLD",
            "{ BKG = BAR.BMP;\n\
             BMP BOTTLE = BOTTLE.BMP POS [10,10];\n\
             SET COMMAND GIVE = TRANSFER OBJECT BOTTLE FROM BAR_WLD TO PLAYER_WLD;\n\
            }",
            true,
        )
        .expect("load bar");
    runtime.render_frame().expect("frame");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.json");
    let records = runtime.save_state();
    fs::write(&path, serde_json::to_string_pretty(&records).expect("serialize"))
        .expect("write snapshot");

    // Mutate the session, then restore from disk.
    runtime.run_object("BAR_WLD", "GIVE").expect("transfer");
    assert!(runtime
        .manager
        .device("PLAYER_WLD")
        .and_then(|d| d.object("BOTTLE"))
        .expect("player bottle")
        .is_attached());

    let loaded: Vec<ObjectRecord> =
        serde_json::from_str(&fs::read_to_string(&path).expect("read snapshot"))
            .expect("deserialize");
    runtime.restore_state(&loaded);

    let bar_bottle = runtime
        .manager
        .device("BAR_WLD")
        .and_then(|d| d.object("BOTTLE"))
        .expect("bar bottle");
    assert!(bar_bottle.is_attached());
    let player_bottle = runtime
        .manager
        .device("PLAYER_WLD")
        .and_then(|d| d.object("BOTTLE"))
        .expect("player bottle");
    assert!(!player_bottle.is_attached());
}

#[test]
fn reload_in_place_replaces_the_world() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 2);
    runtime
        .load_world("BAR_WLD", "{ BKG = OLD.BMP; BMP OLD = OLD.BMP; }", true)
        .expect("load");
    runtime
        .load_world("BAR_WLD", "{ BKG = NEW.BMP; BMP NEW = NEW.BMP; }", true)
        .expect("reload");

    let device = runtime.manager.device("BAR_WLD").expect("device");
    assert_eq!(device.background(), "NEW.BMP");
    assert!(device.object("OLD").is_none());
    assert!(device.object("NEW").expect("new object").is_attached());
    assert_eq!(runtime.current_sdev(), Some("BAR_WLD"));
}

#[test]
fn unload_purges_scene_local_variables() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 2);
    runtime
        .load_world(
            "BAR_WLD",
            "{ SET VAR INBAR = 1; SET VAR VISITED AS GLOBAL = 1; }",
            false,
        )
        .expect("load");
    assert_eq!(runtime.vars.value("INBAR"), Some("1"));

    runtime.unload_world("BAR_WLD");
    assert!(runtime.manager.device("BAR_WLD").is_none());
    assert_eq!(runtime.vars.value("INBAR"), None);
    assert_eq!(runtime.vars.value("VISITED"), Some("1"));
}
