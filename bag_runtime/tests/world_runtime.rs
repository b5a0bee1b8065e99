//! End-to-end runs over small world scripts: parse, attach, paint, and
//! watch the activation pass drive flags and host traffic.

use bag_runtime::host::{HostEvent, Hosts};
use bag_runtime::{BagRuntime, StorageDevice};

fn attached_implies_active(device: &StorageDevice) {
    for object in device.objects() {
        if object.is_attached() {
            assert!(
                object.is_active(),
                "'{}' attached while inactive",
                object.name()
            );
        }
    }
}

#[test]
fn set_declares_and_run_text_comes_up() {
    let (hosts, log, _) = Hosts::recording();
    let mut runtime = BagRuntime::with_seed(hosts, 1);
    runtime
        .load_world(
            "BAR_WLD",
            "{ BKG = BAR.BMP; SET VAR INBAR = 1; RUN TXT GREET = HELLO VAR INBAR SIZE 12; }",
            true,
        )
        .expect("load");

    assert_eq!(runtime.vars.value("INBAR"), Some("1"));
    let device = runtime.manager.device("BAR_WLD").expect("device");
    let decl = device.object("INBAR").expect("var object");
    assert!(decl.is_active());
    assert!(decl.is_attached());
    assert!(!decl.is_immediate_run());
    let greet = device.object("GREET").expect("text object");
    assert!(greet.is_active());
    assert!(greet.is_attached());
    attached_implies_active(device);

    runtime.render_frame().expect("frame");
    assert!(log
        .events()
        .iter()
        .any(|e| matches!(e, HostEvent::Update { kind, name } if kind == "TXT" && name == "GREET")));
}

#[test]
fn second_pass_is_idempotent() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 1);
    runtime
        .load_world(
            "BAR_WLD",
            "{\n\
             SET VAR SCORE = 5;\n\
             IF (SCORE > 10)\n\
               BMP WIN = WIN.BMP;\n\
             ELSE\n\
               BMP LOSE = LOSE.BMP;\n\
             ENDIF\n\
             BMP ALWAYS = ALWAYS.BMP;\n\
            }",
            true,
        )
        .expect("load");
    runtime.render_frame().expect("frame");

    let snapshot = |runtime: &BagRuntime| -> Vec<(String, bool, bool)> {
        runtime
            .manager
            .device("BAR_WLD")
            .expect("device")
            .objects()
            .iter()
            .map(|o| (o.name().to_string(), o.is_active(), o.is_attached()))
            .collect()
    };
    let first = snapshot(&runtime);
    runtime.attach_active_objects("BAR_WLD").expect("pass");
    assert_eq!(snapshot(&runtime), first);
}

#[test]
fn gate_flip_rewires_activation_on_the_next_pass() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 1);
    runtime
        .load_world(
            "BAR_WLD",
            "{\n\
             SET VAR SCORE = 5;\n\
             IF (SCORE > 10)\n\
               BMP WIN = WIN.BMP;\n\
             ELSE\n\
               BMP LOSE = LOSE.BMP;\n\
             ENDIF\n\
            }",
            true,
        )
        .expect("load");

    let device = runtime.manager.device("BAR_WLD").expect("device");
    assert!(!device.object("WIN").expect("win").is_attached());
    assert!(device.object("LOSE").expect("lose").is_attached());

    runtime.vars.set("SCORE", "15").expect("writable");
    runtime.render_frame().expect("frame");

    let device = runtime.manager.device("BAR_WLD").expect("device");
    let win = device.object("WIN").expect("win");
    let lose = device.object("LOSE").expect("lose");
    assert!(win.is_attached());
    assert!(!lose.is_attached());
    assert!(!(win.is_attached() && lose.is_attached()));
    attached_implies_active(device);
}

#[test]
fn immediate_run_waits_for_first_paint_and_sounds_linger() {
    let (hosts, log, audio) = Hosts::recording();
    let mut runtime = BagRuntime::with_seed(hosts, 1);
    runtime
        .load_world(
            "BAR_WLD",
            "{\n\
             SET VAR MUSIC = 1;\n\
             IF (MUSIC == 1)\n\
               RUN SND JUKEBOX = JUKEBOX.WAV LOOP 0;\n\
             ENDIF\n\
            }",
            true,
        )
        .expect("load");

    // Attached at load, but the action holds until the scene has painted.
    assert!(log
        .events()
        .iter()
        .all(|e| !matches!(e, HostEvent::SoundPlay { .. })));

    runtime.render_frame().expect("frame");
    assert!(log
        .events()
        .iter()
        .any(|e| matches!(e, HostEvent::SoundPlay { handle, .. } if handle == "JUKEBOX")));

    // Gate drops while the sound still plays: the object is exempt.
    runtime.vars.set("MUSIC", "0").expect("writable");
    runtime.render_frame().expect("frame");
    let device = runtime.manager.device("BAR_WLD").expect("device");
    assert!(device.object("JUKEBOX").expect("sound").is_attached());

    // Playback ends; the next pass tears it down.
    audio.set_playing("JUKEBOX", false);
    runtime.render_frame().expect("frame");
    let device = runtime.manager.device("BAR_WLD").expect("device");
    assert!(!device.object("JUKEBOX").expect("sound").is_attached());
}

#[test]
fn held_objects_fire_once_activated_on_the_next_pass() {
    let (hosts, log, _) = Hosts::recording();
    let mut runtime = BagRuntime::with_seed(hosts, 1);
    runtime
        .load_world(
            "BAR_WLD",
            "{ BKG = BAR.BMP;\n\
             HOLD SND JUKEBOX = JUKEBOX.WAV;\n\
             SET COMMAND START = INSERT OBJECT JUKEBOX;\n\
            }",
            true,
        )
        .expect("load");
    runtime.render_frame().expect("frame");

    // The pass skips the held object; SET attaches without running.
    let device = runtime.manager.device("BAR_WLD").expect("device");
    let sound = device.object("JUKEBOX").expect("sound");
    assert!(!sound.is_active());
    assert!(!sound.is_attached());
    assert!(device.object("START").expect("command").is_attached());
    assert!(log
        .events()
        .iter()
        .all(|e| !matches!(e, HostEvent::SoundPlay { .. })));

    // Activation attaches it with the carried action armed.
    runtime.run_object("BAR_WLD", "START").expect("run command");
    let device = runtime.manager.device("BAR_WLD").expect("device");
    assert!(device.object("JUKEBOX").expect("sound").is_attached());
    assert!(log
        .events()
        .iter()
        .all(|e| !matches!(e, HostEvent::SoundPlay { .. })));

    runtime.render_frame().expect("frame");
    assert!(log
        .events()
        .iter()
        .any(|e| matches!(e, HostEvent::SoundPlay { handle, .. } if handle == "JUKEBOX")));
}

#[test]
fn modal_flag_clears_when_the_modal_object_detaches() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 1);
    runtime
        .load_world(
            "BAR_WLD",
            "{\n\
             SET VAR ALARM = 1;\n\
             IF (ALARM == 1)\n\
               BMP WARNING = WARN.BMP MODAL;\n\
             ENDIF\n\
            }",
            true,
        )
        .expect("load");
    let device = runtime.manager.device("BAR_WLD").expect("device");
    assert!(device.object("WARNING").expect("warning").is_attached());
    assert!(device.contains_modal());

    runtime.vars.set("ALARM", "0").expect("writable");
    runtime.render_frame().expect("frame");
    let device = runtime.manager.device("BAR_WLD").expect("device");
    assert!(!device.object("WARNING").expect("warning").is_attached());
    assert!(!device.contains_modal());
}

#[test]
fn link_traversal_switches_the_scene_and_ends_the_pass() {
    let (hosts, log, _) = Hosts::recording();
    let mut runtime = BagRuntime::with_seed(hosts, 1);
    runtime
        .load_world("HALL_WLD", "{ BKG = HALL.BMP; BMP RUG = RUG.BMP; }", false)
        .expect("load hall");
    runtime
        .load_world(
            "BAR_WLD",
            "{ BKG = BAR.BMP; RUN LNK DOOR = DOOR.BMP TO HALL_WLD FADE 2; }",
            true,
        )
        .expect("load bar");

    runtime.render_frame().expect("frame");
    assert_eq!(runtime.current_sdev(), Some("HALL_WLD"));
    assert!(log
        .events()
        .iter()
        .any(|e| matches!(e, HostEvent::Transition { device, fade_id }
            if device == "HALL_WLD" && *fade_id == 2)));

    // Old scene is fully torn down, new scene is live.
    let bar = runtime.manager.device("BAR_WLD").expect("bar");
    assert!(bar.objects().iter().all(|o| !o.is_attached()));
    let hall = runtime.manager.device("HALL_WLD").expect("hall");
    assert!(hall.object("RUG").expect("rug").is_attached());
}

#[test]
fn transfer_command_toggles_activation_across_devices() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 1);
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

    let bar_bottle = runtime
        .manager
        .device("BAR_WLD")
        .and_then(|d| d.object("BOTTLE"))
        .expect("bar bottle");
    assert!(bar_bottle.is_attached());

    runtime.run_object("BAR_WLD", "GIVE").expect("run command");

    let bar_bottle = runtime
        .manager
        .device("BAR_WLD")
        .and_then(|d| d.object("BOTTLE"))
        .expect("bar bottle");
    assert!(!bar_bottle.is_active());
    assert!(!bar_bottle.is_attached());
    let player_bottle = runtime
        .manager
        .device("PLAYER_WLD")
        .and_then(|d| d.object("BOTTLE"))
        .expect("player bottle");
    assert!(player_bottle.is_active());
    assert!(player_bottle.is_attached());
}

#[test]
fn floating_objects_paginate_deterministically() {
    let script = "{ BKG = INV.BMP SIZE [640,480];\n\
        TNG A = A.BMP SIZE [320,300];\n\
        TNG B = B.BMP SIZE [320,300];\n\
        TNG C = C.BMP SIZE [320,300];\n\
        TNG D = D.BMP SIZE [320,300];\n\
        TNG E = E.BMP SIZE [320,300];\n\
        TNG F = F.BMP SIZE [320,300];\n\
    }";
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 1);
    runtime.load_world("INV_WLD", script, true).expect("load");

    let pages = |runtime: &BagRuntime| -> Vec<usize> {
        let device = runtime.manager.device("INV_WLD").expect("device");
        ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|n| device.object(n).expect("thing").float_page())
            .collect()
    };
    // two per 640px row, 300px rows, 480px pages
    assert_eq!(pages(&runtime), vec![0, 0, 0, 0, 1, 1]);
    let device = runtime.manager.device("INV_WLD").expect("device");
    assert_eq!(device.float_pages(), 2);

    runtime.render_frame().expect("frame");
    assert_eq!(pages(&runtime), vec![0, 0, 0, 0, 1, 1]);
}

#[test]
fn residue_print_inserts_dossiers_once_touched() {
    let mut runtime = BagRuntime::with_seed(Hosts::default(), 1);
    runtime
        .load_world(
            "KIOSK_WLD",
            "{ BKG = KIOSK.BMP;\n\
             SET VAR P1TOUCH = 0;\n\
             SET RPO PRINT1 = PRINT1.BMP TOUCHED VAR P1TOUCH DOS DEVEN;\n\
             HOLD DOS DEVEN = DEVEN.TXT SUSPECT VAR DEVENSEEN;\n\
            }",
            true,
        )
        .expect("load");

    runtime.run_object("KIOSK_WLD", "PRINT1").expect("run print");
    let deven = runtime
        .manager
        .device("KIOSK_WLD")
        .and_then(|d| d.object("DEVEN"))
        .expect("dossier");
    assert!(!deven.is_attached());

    runtime.vars.set("P1TOUCH", "1").expect("writable");
    runtime.run_object("KIOSK_WLD", "PRINT1").expect("run print");
    let deven = runtime
        .manager
        .device("KIOSK_WLD")
        .and_then(|d| d.object("DEVEN"))
        .expect("dossier");
    assert!(deven.is_attached());

    runtime.run_object("KIOSK_WLD", "DEVEN").expect("run dossier");
    assert_eq!(runtime.vars.value("DEVENSEEN"), Some("1"));
}
