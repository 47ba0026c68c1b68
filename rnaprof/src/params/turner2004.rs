//! The 2004 parameter set.

use super::{
    build_int11, build_int21, build_int22, kt_at, DangleTable, Int11Table, Int21Table, Int22Table,
    LoopInitTable, MismatchTable, PairTable, Params, SpecialHairpins, INF_ENERGY,
};
use std::sync::LazyLock;

const INF: i32 = INF_ENERGY;

const TEMPERATURE: f64 = 37.0;
const LXC: f64 = 107.856;
const ML_INTERN: i32 = -90;
const ML_CLOSING: i32 = 930;
const ML_BASE: i32 = 0;
const MAX_NINIO: i32 = 300;
const NINIO: i32 = 60;
const TERMINAL_AU: i32 = 50;

static STACK: PairTable = [
    [INF, INF, INF, INF, INF, INF, INF, INF],
    [INF, -240, -330, -210, -140, -210, -210, -140],
    [INF, -330, -340, -250, -150, -220, -240, -150],
    [INF, -210, -250, 130, -50, -140, -130, 130],
    [INF, -140, -150, -50, 30, -60, -100, 30],
    [INF, -210, -220, -140, -60, -110, -90, -60],
    [INF, -210, -240, -130, -100, -90, -130, -90],
    [INF, -140, -150, 130, 30, -60, -90, 130],
];

static HAIRPIN: LoopInitTable = [
    INF, INF, INF, 540, 560, 570, 540, 600, 550, 640, 650, 660, 670, 678, 686, 694, 701, 707, 713,
    719, 725, 730, 735, 740, 744, 749, 753, 757, 761, 765, 769,
];

static BULGE: LoopInitTable = [
    INF, 380, 280, 320, 360, 400, 440, 459, 470, 480, 490, 500, 510, 519, 527, 534, 541, 548, 554,
    560, 565, 571, 576, 580, 585, 589, 594, 598, 602, 605, 609,
];

static INTERNAL_LOOP: LoopInitTable = [
    INF, INF, 410, 510, 160, 180, 200, 220, 230, 240, 250, 260, 270, 278, 286, 294, 301, 307, 313,
    319, 325, 330, 335, 340, 345, 349, 353, 357, 361, 365, 369,
];

static MISMATCH_INTERNAL: MismatchTable = [
    // NP
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // CG
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, -80, 0],
        [0, 0, 0, 0, 0],
        [0, -80, 0, 0, 0],
        [0, 0, 0, 0, -60],
    ],
    // GC
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, -80, 0],
        [0, 0, 0, 0, 0],
        [0, -80, 0, 0, 0],
        [0, 0, 0, 0, -60],
    ],
    // GU
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -30, 70],
        [0, 70, 70, 70, 70],
        [0, -30, 70, 70, 70],
        [0, 70, 70, 70, 0],
    ],
    // UG
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -30, 70],
        [0, 70, 70, 70, 70],
        [0, -30, 70, 70, 70],
        [0, 70, 70, 70, 0],
    ],
    // AU
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -30, 70],
        [0, 70, 70, 70, 70],
        [0, -30, 70, 70, 70],
        [0, 70, 70, 70, 0],
    ],
    // UA
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -30, 70],
        [0, 70, 70, 70, 70],
        [0, -30, 70, 70, 70],
        [0, 70, 70, 70, 0],
    ],
];

static MISMATCH_INTERNAL_1N: MismatchTable = [
    // NP
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // CG
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // GC
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // GU
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
    ],
    // UG
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
    ],
    // AU
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
    ],
    // UA
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
        [0, 70, 70, 70, 70],
    ],
];

static MISMATCH_INTERNAL_23: MismatchTable = [
    // NP
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // CG
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, -50, 0],
        [0, 0, 0, 0, 0],
        [0, -50, 0, 0, 0],
        [0, 0, 0, 0, -30],
    ],
    // GC
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, -50, 0],
        [0, 0, 0, 0, 0],
        [0, -50, 0, 0, 0],
        [0, 0, 0, 0, -30],
    ],
    // GU
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -20, 70],
        [0, 70, 70, 70, 70],
        [0, -20, 70, 70, 70],
        [0, 70, 70, 70, 30],
    ],
    // UG
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -20, 70],
        [0, 70, 70, 70, 70],
        [0, -20, 70, 70, 70],
        [0, 70, 70, 70, 30],
    ],
    // AU
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -20, 70],
        [0, 70, 70, 70, 70],
        [0, -20, 70, 70, 70],
        [0, 70, 70, 70, 30],
    ],
    // UA
    [
        [0, 0, 0, 0, 0],
        [0, 70, 70, -20, 70],
        [0, 70, 70, 70, 70],
        [0, -20, 70, 70, 70],
        [0, 70, 70, 70, 30],
    ],
];

static MISMATCH_HAIRPIN: MismatchTable = [
    // NP
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // CG
    [
        [0, 0, 0, 0, 0],
        [-80, -150, -150, -140, -180],
        [-80, -100, -90, -290, -80],
        [-80, -220, -200, -160, -110],
        [-80, -170, -140, -180, -200],
    ],
    // GC
    [
        [0, 0, 0, 0, 0],
        [-70, -110, -150, -130, -210],
        [-70, -110, -70, -240, -50],
        [-70, -240, -290, -140, -120],
        [-70, -190, -100, -220, -150],
    ],
    // GU
    [
        [0, 0, 0, 0, 0],
        [0, 20, -50, -30, -30],
        [0, -10, -20, -150, -20],
        [0, -90, -110, -30, 0],
        [0, -30, -30, -40, -110],
    ],
    // UG
    [
        [0, 0, 0, 0, 0],
        [0, -50, -30, -60, -50],
        [0, -20, -10, -170, 0],
        [0, -80, -120, -30, -70],
        [0, -60, -10, -60, -80],
    ],
    // AU
    [
        [0, 0, 0, 0, 0],
        [0, -30, -50, -30, -30],
        [0, -10, -20, -150, -20],
        [0, -110, -120, -20, 20],
        [0, -30, -30, -60, -110],
    ],
    // UA
    [
        [0, 0, 0, 0, 0],
        [0, -50, -30, -60, -50],
        [0, -20, -10, -120, 0],
        [0, -140, -120, -70, -20],
        [0, -30, -10, -50, -80],
    ],
];

static MISMATCH_EXTERNAL: MismatchTable = [
    // NP
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // CG
    [
        [-50, -110, -40, -130, -60],
        [-90, -160, -90, -180, -110],
        [-70, -140, -70, -160, -90],
        [-60, -130, -60, -150, -80],
        [-50, -120, -50, -140, -70],
    ],
    // GC
    [
        [-80, -170, -80, -170, -120],
        [-100, -190, -100, -190, -140],
        [-110, -200, -110, -200, -150],
        [-80, -170, -80, -170, -120],
        [-80, -170, -80, -170, -120],
    ],
    // GU
    [
        [-30, -70, -10, -70, -10],
        [-40, -100, -40, -100, -40],
        [-40, -100, -40, -100, -40],
        [-50, -110, -50, -110, -50],
        [-30, -90, -30, -90, -30],
    ],
    // UG
    [
        [-60, -80, -50, -80, -60],
        [-80, -110, -80, -110, -90],
        [-60, -90, -60, -90, -70],
        [-70, -100, -70, -100, -80],
        [-70, -100, -70, -100, -80],
    ],
    // AU
    [
        [-30, -70, -10, -70, -10],
        [-40, -100, -40, -100, -40],
        [-40, -100, -40, -100, -40],
        [-50, -110, -50, -110, -50],
        [-30, -90, -30, -90, -30],
    ],
    // UA
    [
        [-60, -80, -50, -80, -60],
        [-80, -110, -80, -110, -90],
        [-60, -90, -60, -90, -70],
        [-70, -100, -70, -100, -80],
        [-70, -100, -70, -100, -80],
    ],
];

static MISMATCH_MULTI: MismatchTable = [
    // NP
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // CG
    [
        [-30, -90, -20, -110, -40],
        [-70, -140, -70, -160, -90],
        [-50, -120, -50, -140, -70],
        [-40, -110, -40, -130, -60],
        [-30, -100, -30, -120, -50],
    ],
    // GC
    [
        [-60, -150, -60, -150, -100],
        [-80, -170, -80, -170, -120],
        [-90, -180, -90, -180, -130],
        [-60, -150, -60, -150, -100],
        [-60, -150, -60, -150, -100],
    ],
    // GU
    [
        [-10, -50, 0, -50, 0],
        [-20, -80, -20, -80, -20],
        [-20, -80, -20, -80, -20],
        [-30, -90, -30, -90, -30],
        [-10, -70, -10, -70, -10],
    ],
    // UG
    [
        [-40, -60, -30, -60, -40],
        [-60, -90, -60, -90, -70],
        [-40, -70, -40, -70, -50],
        [-50, -80, -50, -80, -60],
        [-50, -80, -50, -80, -60],
    ],
    // AU
    [
        [-10, -50, 0, -50, 0],
        [-20, -80, -20, -80, -20],
        [-20, -80, -20, -80, -20],
        [-30, -90, -30, -90, -30],
        [-10, -70, -10, -70, -10],
    ],
    // UA
    [
        [-40, -60, -30, -60, -40],
        [-60, -90, -60, -90, -70],
        [-40, -70, -40, -70, -50],
        [-50, -80, -50, -80, -60],
        [-50, -80, -50, -80, -60],
    ],
];

static DANGLE5: DangleTable = [
    [INF, INF, INF, INF, INF],
    [-10, -50, -30, -20, -10],
    [0, -20, -30, 0, 0],
    [-20, -30, -30, -40, -20],
    [-10, -30, -10, -20, -20],
    [-20, -30, -30, -40, -20],
    [-10, -30, -10, -20, -20],
    [0, -20, -10, 0, 0],
];

static DANGLE3: DangleTable = [
    [INF, INF, INF, INF, INF],
    [-40, -110, -40, -130, -60],
    [-80, -170, -80, -170, -120],
    [-10, -70, -10, -70, -10],
    [-50, -80, -50, -80, -60],
    [-10, -70, -10, -70, -10],
    [-50, -80, -50, -80, -60],
    [-10, -70, -10, -70, -10],
];

static SPECIAL_HAIRPINS: SpecialHairpins = SpecialHairpins {
    triloops: "CAACG GUUAC",
    triloop: &[680, 690],
    tetraloops: "CAACGG CCAAGG CCACGG CCCAGG CCGAGG CCGCGG CCUAGG CCUCGG CUAAGG CUACGG CUCAGG \
                 CUCCGG CUGCGG CUUAGG CUUCGG CUUUGG",
    tetraloop: &[
        550, 330, 370, 340, 350, 360, 370, 250, 360, 280, 370, 270, 280, 350, 370, 370,
    ],
    hexaloops: "ACAGUACU ACAGUGAU ACAGUGCU ACAGUGUU",
    hexaloop: &[280, 360, 290, 180],
};

static INT11: LazyLock<Box<Int11Table>> =
    LazyLock::new(|| build_int11(&INTERNAL_LOOP, &MISMATCH_INTERNAL_1N));
static INT21: LazyLock<Box<Int21Table>> =
    LazyLock::new(|| build_int21(&INTERNAL_LOOP, NINIO, MAX_NINIO, &MISMATCH_INTERNAL_1N));
static INT22: LazyLock<Box<Int22Table>> =
    LazyLock::new(|| build_int22(&INTERNAL_LOOP, &MISMATCH_INTERNAL));

pub(super) static PARAMS: LazyLock<Params> = LazyLock::new(|| Params {
    temperature: TEMPERATURE,
    kt: kt_at(TEMPERATURE),
    lxc: LXC,
    ml_intern: ML_INTERN,
    ml_closing: ML_CLOSING,
    ml_base: ML_BASE,
    max_ninio: MAX_NINIO,
    ninio: NINIO,
    terminal_au: TERMINAL_AU,
    stack: &STACK,
    hairpin: &HAIRPIN,
    bulge: &BULGE,
    internal_loop: &INTERNAL_LOOP,
    mismatch_internal: &MISMATCH_INTERNAL,
    mismatch_internal_1n: &MISMATCH_INTERNAL_1N,
    mismatch_internal_23: &MISMATCH_INTERNAL_23,
    mismatch_hairpin: &MISMATCH_HAIRPIN,
    mismatch_multi: Some(&MISMATCH_MULTI),
    mismatch_external: Some(&MISMATCH_EXTERNAL),
    dangle5: &DANGLE5,
    dangle3: &DANGLE3,
    int11: &**LazyLock::force(&INT11),
    int21: &**LazyLock::force(&INT21),
    int22: &**LazyLock::force(&INT22),
    special_hairpins: Some(&SPECIAL_HAIRPINS),
    use_fast_logsumexp: true,
});
