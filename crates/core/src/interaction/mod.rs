pub mod drag_fsm;
